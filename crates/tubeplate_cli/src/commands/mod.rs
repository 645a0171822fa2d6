pub(crate) mod channel;
pub(crate) mod meta;
pub(crate) mod migrate;
pub(crate) mod shared;
pub(crate) mod sync;
pub(crate) mod update;
