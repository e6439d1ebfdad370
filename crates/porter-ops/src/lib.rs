//! Notifier-aware filesystem primitives for the porter task engine.
//!
//! Every long-running primitive in this crate (copy, move, delete,
//! search) reports progress through a bundle of channels and observes a
//! cancellation token at its checkpoints. The task layer owns the
//! receiving half of the channels and merges the events into a shared
//! output snapshot.

mod analyze;
mod copy;
mod delete;
mod fsops;
mod move_op;
mod notify;
mod path;
mod reader;
mod search;

pub use analyze::{SourceSummary, analyze_source};
pub use copy::copy;
pub use delete::delete;
pub use fsops::{FileEntry, chmod, create_file, make_directory, read_dir, read_text_file, rename, write_text_file};
pub use move_op::move_path;
pub use notify::{
    DeleteNotifier, DeleteReceivers, SearchNotifier, SearchReceivers, TransferNotifier,
    TransferReceivers, delete_channel, search_channel, transfer_channel,
};
pub use reader::CounterReader;
pub use search::{FoundFile, search};
