mod supervisor;

pub use supervisor::{ProcessSupervisor, SupervisorConfig};
