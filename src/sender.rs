//! Built-in sender
//! If you want to drive the controller over another bus, you will need to implement [`SendCommand`] trait

use crate::command::{Command, DataWidth};

mod parallel_sender;

pub use parallel_sender::ParallelSender;

/// [`SendCommand`] is the trait a sender should implement to communicate with the hardware
///
/// A sender only knows bus cycles; waiting for the controller to finish
/// an instruction is left to [`Lcd`](crate::lcd::Lcd).
pub trait SendCommand {
    /// Error of the underlying pins
    type Error;

    /// Run the bus cycles of one [`Command`]
    ///
    /// Returns the byte read back for a [`Command::Read`], or `None` when
    /// this sender cannot read (no cycle is issued in that case).
    fn send(&mut self, command: impl Into<Command>) -> Result<Option<u8>, Self::Error>;

    /// Width of the data bus this sender is wired with
    fn get_data_width(&self) -> DataWidth;

    /// Whether reads (busy flag, RAM contents) are possible
    fn can_read(&self) -> bool;
}
