pub mod agent_cmd;
pub mod doctor;
pub mod run_cmd;
pub mod tools_cmd;
