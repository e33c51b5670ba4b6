use serde::{Deserialize, Serialize};
use webscout_core::Result;

/// A tool-calling agent, fully described by configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    pub name: String,
    pub description: String,
    /// The system instruction handed verbatim to the model.
    pub instruction: String,
    pub model: String,
    /// Tool names the agent may call, matching the registry.
    pub tools: Vec<String>,
}

impl AgentDefinition {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

const WEB_RECON_INSTRUCTION: &str = "\
You are an expert web security researcher with strong JavaScript skills. \
Your job is to produce a detailed security report of critical vulnerabilities \
arising from improper or non-standard RFC implementations of web protocols on \
the given website. Use the browser control tools to analyse it.

The first step is to call open_browser to open the browser if it is not \
opened yet; use open_browser ONLY for that. Use go_to_url to visit any url. \
Use get_current_url when you want to save the current url and return to it \
later after visiting other urls. Use execute_javascript to: (1) run your \
JavaScript directly on the visited page, for example to read its source; \
(2) run an exploit directly against the visited page; (3) test whether a \
vulnerability exists; (4) manipulate the page; (5) perform GET or POST \
requests from the page. Use take_screenshot to capture the working page ONLY \
if necessary, because it costs money and consumes resources.

If the user provides login credentials, you MUST log in to the specified \
website using JavaScript execution. If login fails, do not proceed: ensure \
login succeeds before continuing, and if the credentials look wrong ask the \
user to correct their details.

Analyse the website for improper or non-standard RFC implementations of web \
protocols. When you need information about an RFC, visit the relevant RFC \
links, collect what you need, then return to the target url and continue \
looking for bugs. After finding vulnerabilities, write a detailed security \
report as the final response.";

/// The default recon agent: prompt and tool list for the browser toolset.
pub fn web_recon_agent(model: &str) -> AgentDefinition {
    AgentDefinition {
        name: "vuln_researcher".to_string(),
        description: "Identifies and reports security vulnerabilities in web applications."
            .to_string(),
        instruction: WEB_RECON_INSTRUCTION.to_string(),
        model: model.to_string(),
        tools: vec![
            "open_browser".to_string(),
            "go_to_url".to_string(),
            "get_current_url".to_string(),
            "go_back".to_string(),
            "sleep_for".to_string(),
            "execute_javascript".to_string(),
            "take_screenshot".to_string(),
            "close_browser".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webscout_tools::ToolRegistry;

    #[test]
    fn definition_serializes() {
        let agent = web_recon_agent("gemini-1.5-pro");
        let json = agent.to_json().unwrap();
        assert!(json.contains("vuln_researcher"));
        assert!(json.contains("execute_javascript"));

        let parsed: AgentDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tools.len(), 8);
    }

    #[test]
    fn every_listed_tool_exists_in_the_registry() {
        let agent = web_recon_agent("gemini-1.5-pro");
        let registry = ToolRegistry::with_defaults();
        for tool in &agent.tools {
            assert!(registry.get(tool).is_some(), "agent lists unknown tool {tool}");
        }
    }

    #[test]
    fn instruction_covers_tool_guidance() {
        let agent = web_recon_agent("gemini-1.5-pro");
        assert!(agent.instruction.contains("open_browser"));
        assert!(agent.instruction.contains("RFC"));
        assert!(agent.instruction.contains("security report"));
    }
}
