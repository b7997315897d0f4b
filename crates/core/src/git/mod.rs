//! Git CLI collaborators: the pipeline step factory and the remote branch
//! probe. The `git` binary is treated strictly as an external executable,
//! inspected only through its exit status and captured output.

pub mod probe;
pub mod step;

pub use probe::branch_exists;
pub use step::GitStep;
