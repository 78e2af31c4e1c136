use thiserror::Error;

macro_rules! config_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Config {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Config {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while constructing a program
/// model, configuring a pointer analysis, and running it to a fixpoint. Each variant provides
/// specific context about the failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Configuration Errors
/// - [`Error::Config`] - Malformed sensitivity descriptor or invalid analysis option
///
/// Configuration errors are always raised before the solver starts; a running analysis is
/// never aborted because of a bad option.
///
/// ## Resolution Errors
/// - [`Error::UnresolvedDispatch`] - Virtual dispatch found no applicable method
/// - [`Error::MethodNotFound`] - A referenced method does not exist in the program model
/// - [`Error::FieldNotFound`] - A referenced field does not exist in the program model
/// - [`Error::ClassNotFound`] - A class name could not be resolved
///
/// Resolution errors indicate an unsound or incomplete program model and are fatal to the
/// current analysis run; continuing would silently corrupt the points-to result.
///
/// ## Program Construction Errors
/// - [`Error::DuplicateClass`] - A class was registered twice under the same name
/// - [`Error::InvalidProgram`] - A structurally invalid statement or method was built
///
/// # Examples
///
/// ```rust
/// use jscope::{Error, analysis::pta::{AnalysisOptions, PointerAnalysis}};
/// use jscope::ir::ProgramBuilder;
///
/// let program = ProgramBuilder::new().finish();
/// let options = AnalysisOptions {
///     sensitivity: "3-zone".to_string(),
///     ..AnalysisOptions::default()
/// };
///
/// match PointerAnalysis::new(&program, options) {
///     Err(Error::Config { message, .. }) => {
///         eprintln!("bad configuration: {}", message);
///     }
///     _ => unreachable!("descriptor is malformed"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The analysis configuration is invalid.
    ///
    /// Raised for malformed sensitivity descriptors (anything that does not parse as
    /// `ci` or `k-kind[-hk]`), unknown variant names in a guided selection plan, and
    /// other option values the analysis cannot honor. The error includes the source
    /// location where the problem was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was rejected
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Config - {file}:{line}: {message}")]
    Config {
        /// The message to be printed for the Config error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Virtual dispatch failed to find an applicable method.
    ///
    /// This error occurs when a virtual or interface call is resolved against a
    /// receiver object whose runtime type admits no matching concrete method. It
    /// indicates an abstract/interface mismatch in the program model and is fatal
    /// to the analysis run.
    #[error("No dispatch target for {method} on receiver class {class}")]
    UnresolvedDispatch {
        /// Name of the receiver class the dispatch started from
        class: String,
        /// Subsignature of the method reference being dispatched
        method: String,
    },

    /// A referenced method was not found in the program model.
    ///
    /// Raised when a static or special call references a method that does not exist
    /// in the named class or any of its superclasses.
    #[error("Method {method} not found in class {class}")]
    MethodNotFound {
        /// Name of the class the lookup started from
        class: String,
        /// Subsignature of the missing method
        method: String,
    },

    /// A referenced field was not found in the program model.
    ///
    /// Raised when field resolution walks the superclass chain without finding a
    /// declared field of the requested name.
    #[error("Field {field} not found in class {class}")]
    FieldNotFound {
        /// Name of the class the lookup started from
        class: String,
        /// Name of the missing field
        field: String,
    },

    /// A class name could not be resolved in the program model.
    #[error("Class not found - {0}")]
    ClassNotFound(String),

    /// A class was registered twice under the same name.
    ///
    /// Class names are the primary identity in the program registry; registering
    /// the same fully qualified name twice is a construction error.
    #[error("Class already registered - {0}")]
    DuplicateClass(String),

    /// A structurally invalid program element was constructed.
    ///
    /// Covers builder misuse such as invoke argument counts that do not match the
    /// target descriptor, a receiver on a static call, or an entry point without a
    /// method body.
    #[error("{0}")]
    InvalidProgram(String),
}
