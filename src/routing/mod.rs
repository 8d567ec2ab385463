//! Rule resolution, sink assembly and record dispatch

pub mod assembler;
pub mod dispatcher;
pub mod resolver;
pub mod target;

pub use assembler::{stream_name, to_file_name_case, Binding, BindingList, StreamAssembler};
pub use dispatcher::Dispatcher;
pub use resolver::resolve;
pub use target::{ConsoleWriterFn, SinkDescriptor, SinkFactory};
