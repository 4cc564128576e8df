// CLI module
//
// - arguments: command-line argument parsing and handling

pub mod arguments;

pub use arguments::ViaductArguments;
