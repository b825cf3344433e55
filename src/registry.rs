//! RAID-Z implementation registry
//!
//! Holds every backend the running CPU supports, in ascending order of
//! expected speed, and the current selection. Besides the backend names the
//! selection accepts:
//!
//! - `fastest`: the last supported backend
//! - `cycle`: rotate through all supported backends on every [`ImplRegistry::ops`]
//!   call, used by stress tests to mix implementations
//!
//! Selecting `original` is the strict reference mode used for bit-exact
//! comparison. All backends must produce identical bytes.

use crate::config::RaidzConfig;
use crate::error::{RaidzError, Result};
use crate::math::scalar::{OriginalKernel, ScalarKernel};
use crate::math::{GfKernel, RaidzImpl, RaidzOps};
use log::{debug, warn};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

pub const IMPL_FASTEST: &str = "fastest";
pub const IMPL_CYCLE: &str = "cycle";
pub const IMPL_ORIGINAL: &str = "original";
pub const IMPL_SCALAR: &str = "scalar";

/// Every backend this build knows about, whether or not the CPU supports it
pub const BACKEND_NAMES: &[&str] = &[
    IMPL_ORIGINAL,
    IMPL_SCALAR,
    "ssse3",
    "avx2",
    "aarch64_neon",
];

/// What [`ImplRegistry::ops`] returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Fastest,
    Cycle,
    /// Index into the supported backends
    Backend(usize),
}

/// Supported backends plus the current selection
#[derive(Debug)]
pub struct ImplRegistry {
    backends: Vec<Box<dyn RaidzOps>>,
    selection: Selection,
    cycle: AtomicUsize,
}

fn push_if_supported<K: GfKernel>(backends: &mut Vec<Box<dyn RaidzOps>>) {
    match RaidzImpl::<K>::new() {
        Some(ops) => backends.push(Box::new(ops)),
        None => debug!("raidz backend {} not supported on this CPU", K::NAME),
    }
}

impl ImplRegistry {
    /// Probe the CPU and register every usable backend, selecting `fastest`
    pub fn detect() -> Self {
        let mut backends: Vec<Box<dyn RaidzOps>> = Vec::new();
        push_if_supported::<OriginalKernel>(&mut backends);
        push_if_supported::<ScalarKernel>(&mut backends);

        #[cfg(target_arch = "x86_64")]
        {
            use crate::math::simd::{Avx2Kernel, Ssse3Kernel};
            push_if_supported::<Ssse3Kernel>(&mut backends);
            push_if_supported::<Avx2Kernel>(&mut backends);
        }

        #[cfg(target_arch = "aarch64")]
        {
            use crate::math::simd::NeonKernel;
            push_if_supported::<NeonKernel>(&mut backends);
        }

        debug!(
            "raidz backends: {:?}",
            backends.iter().map(|b| b.name()).collect::<Vec<_>>()
        );

        Self {
            backends,
            selection: Selection::Fastest,
            cycle: AtomicUsize::new(0),
        }
    }

    /// Probe and apply `config`; an unsupported name keeps `fastest`
    pub fn from_config(config: &RaidzConfig) -> Self {
        let mut registry = Self::detect();
        if let Err(e) = config.apply(&mut registry) {
            warn!("{}; using {}", e, IMPL_FASTEST);
        }
        registry
    }

    /// Process-wide registry configured from the environment on first use
    pub fn global() -> &'static ImplRegistry {
        static GLOBAL: OnceLock<ImplRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| Self::from_config(&RaidzConfig::from_env()))
    }

    /// Select an implementation by name
    ///
    /// Surrounding whitespace is ignored. Unknown or unsupported names return
    /// [`RaidzError::NotSupported`] and leave the selection unchanged.
    pub fn set_impl(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        let selection = match name {
            IMPL_FASTEST => Selection::Fastest,
            IMPL_CYCLE => Selection::Cycle,
            _ => self
                .backends
                .iter()
                .position(|b| b.name() == name)
                .map(Selection::Backend)
                .ok_or_else(|| RaidzError::NotSupported(name.to_string()))?,
        };
        debug!("raidz implementation: {}", name);
        self.selection = selection;
        Ok(())
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Name of the current selection as accepted by [`Self::set_impl`]
    pub fn selected_name(&self) -> &'static str {
        match self.selection {
            Selection::Fastest => IMPL_FASTEST,
            Selection::Cycle => IMPL_CYCLE,
            Selection::Backend(i) => self.backends[i].name(),
        }
    }

    /// The backend to use for the next operation
    pub fn ops(&self) -> &dyn RaidzOps {
        match self.selection {
            Selection::Fastest => self.fastest(),
            Selection::Cycle => {
                let i = self.cycle.fetch_add(1, Ordering::Relaxed) % self.backends.len();
                self.backends[i].as_ref()
            }
            Selection::Backend(i) => self.backends[i].as_ref(),
        }
    }

    pub fn fastest(&self) -> &dyn RaidzOps {
        // `original` and `scalar` are always registered
        self.backends[self.backends.len() - 1].as_ref()
    }

    /// The byte-wise reference backend
    pub fn original(&self) -> &dyn RaidzOps {
        self.backends[0].as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&dyn RaidzOps> {
        let name = name.trim();
        self.backends
            .iter()
            .find(|b| b.name() == name)
            .map(|b| b.as_ref())
    }

    /// Supported backends, slowest first
    pub fn backends(&self) -> impl Iterator<Item = &dyn RaidzOps> {
        self.backends.iter().map(|b| b.as_ref())
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Every name accepted by [`Self::set_impl`]
    pub fn selection_names(&self) -> Vec<&'static str> {
        let mut names = vec![IMPL_FASTEST, IMPL_CYCLE];
        names.extend(self.backend_names());
        names
    }
}

impl Default for ImplRegistry {
    fn default() -> Self {
        Self::detect()
    }
}

/// Lists selectable names with the current one in brackets
impl fmt::Display for ImplRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let selected = self.selected_name();
        let mut first = true;
        for name in self.selection_names() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            if name == selected {
                write!(f, "[{}]", name)?;
            } else {
                f.write_str(name)?;
            }
        }
        Ok(())
    }
}
