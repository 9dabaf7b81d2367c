use std::sync::Mutex;

use sysinfo::System;

/// Periodic host CPU/memory snapshot logged while the engine runs. Purely
/// diagnostic: sampling failures are logged and swallowed.
pub struct ResourceSampler {
    system: Mutex<System>,
}

impl ResourceSampler {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    pub fn sample(&self) {
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::debug!("Resource sampler lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        system.refresh_memory();
        system.refresh_cpu_usage();

        let used_mb = system.used_memory() / 1024 / 1024;
        let total_mb = system.total_memory() / 1024 / 1024;
        tracing::debug!(
            cpu_percent = format!("{:.1}", system.global_cpu_usage()),
            memory_used_mb = used_mb,
            memory_total_mb = total_mb,
            "Host resource sample"
        );
    }
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_never_panics() {
        let sampler = ResourceSampler::new();
        sampler.sample();
        sampler.sample();
    }
}
