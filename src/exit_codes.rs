//! Exit codes of the `noc-reconcile` binary.
//!
//! Scripts rely on these values; do not renumber them.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | General error                                       |
//! | 2    | Usage or configuration error                        |
//! | 3    | The cloud translator reported an error              |
//! | 4    | Local translation model unavailable or failed       |
//! | 5    | A CSV file could not be read or written             |

use crate::table::TableError;
use crate::translation::TranslateError;

pub const EXIT_SUCCESS: u8 = 0;

/// Unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Bad arguments, or the cloud translator is needed but not configured.
pub const EXIT_USAGE: u8 = 2;

/// The cloud API answered with an error object, or with something unreadable.
pub const EXIT_CLOUD_API: u8 = 3;

pub const EXIT_LOCAL_MODEL: u8 = 4;

pub const EXIT_TABLE_IO: u8 = 5;

/// Exit code for an error that ended the run.
pub fn for_error(error: &anyhow::Error) -> u8 {
    if let Some(error) = error.downcast_ref::<TranslateError>() {
        return match error {
            TranslateError::MissingCloudConfig => EXIT_USAGE,
            TranslateError::ModelUnavailable { .. } | TranslateError::LocalModel(_) => {
                EXIT_LOCAL_MODEL
            }
            TranslateError::Api { .. } | TranslateError::MalformedResponse(_) => EXIT_CLOUD_API,
            TranslateError::Connection(_) | TranslateError::InvalidRequest(_) => EXIT_ERROR,
        };
    }
    if error.downcast_ref::<TableError>().is_some() {
        return EXIT_TABLE_IO;
    }
    EXIT_ERROR
}
