mod error;
pub use error::{ExecError, ExecResult};

pub mod proc;
pub use proc::{ProcConfig, ProcRunner};

mod ext;
pub use ext::SubprocessExt;

mod util;

pub mod prelude {
    pub use crate::SubprocessExt;
    pub use crate::error::{ExecError, ExecResult};
    pub use crate::proc::{ProcConfig, ProcRunner};
}
