pub mod agent_loop;
pub mod conversation;
pub mod provider;
