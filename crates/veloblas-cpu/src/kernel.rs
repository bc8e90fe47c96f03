//! Kernel handles being configured for submission.

use std::sync::Arc;

use veloblas_core::{Error, Event, Kernel, KernelArg, KernelOptions, Result};

use crate::engine::EngineInner;
use crate::invocation::HostKernelFn;

/// Positional-argument limit per kernel.
pub(crate) const MAX_KERNEL_ARGS: usize = 32;

/// A resolved host kernel plus the state accumulated before submission.
pub(crate) struct CpuKernel {
    pub(crate) inner: Arc<EngineInner>,
    pub(crate) module: String,
    pub(crate) name: String,
    pub(crate) body: HostKernelFn,
    pub(crate) args: Vec<Option<KernelArg>>,
    pub(crate) options: Option<KernelOptions>,
}

impl Kernel for CpuKernel {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_arg(&mut self, index: usize, arg: KernelArg) -> Result<()> {
        if index >= MAX_KERNEL_ARGS {
            return Err(Error::InvalidArgument {
                index,
                reason: format!("index exceeds the {MAX_KERNEL_ARGS}-argument limit"),
            });
        }
        if index >= self.args.len() {
            self.args.resize_with(index + 1, || None);
        }
        self.args[index] = Some(arg);
        Ok(())
    }

    fn set_options(&mut self, options: KernelOptions) -> Result<()> {
        if options.global.is_empty() {
            return Err(Error::InvalidLaunch("global work size is empty".to_string()));
        }
        if let Some(local) = options.local {
            if local.is_empty() {
                return Err(Error::InvalidLaunch("local work size is empty".to_string()));
            }
            if !options.global.divisible_by(&local) {
                return Err(Error::InvalidLaunch(format!(
                    "global size {} not divisible by local size {}",
                    options.global, local
                )));
            }
        }
        self.options = Some(options);
        Ok(())
    }

    fn submit(self: Box<Self>, deps: &[Event]) -> Result<Event> {
        let inner = self.inner.clone();
        inner.submit_kernel(*self, deps)
    }
}
