pub mod archive;
pub mod branch;

pub use archive::extract_zip_into;
pub use branch::{BRANCH_PREFIX, add_branch_prefix, strip_branch_prefix};
