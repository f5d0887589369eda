//! How the command line front end turns its arguments into a data source.

pub mod args;

use self::args::{Args, BackendArg};
use crate::collection::{Backend, SourceOptions};

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => Backend::Auto,
            BackendArg::Procfs => Backend::Procfs,
            BackendArg::Sysctl => Backend::Sysctl,
        }
    }
}

impl Args {
    /// Returns the [`SourceOptions`] these arguments describe.
    pub fn source_options(&self) -> SourceOptions {
        SourceOptions {
            backend: self.source_args.backend.into(),
            proc_root: self.source_args.proc_root.clone(),
        }
    }
}
