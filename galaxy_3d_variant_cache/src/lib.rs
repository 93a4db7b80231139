/*!
# Galaxy 3D Variant Cache

Resource-variant caching and incremental hot reload for the Galaxy 3D
rendering engine.

Declarative resource descriptions are turned into expensive derived
objects at most once per distinct description:

- shader source + define set → linked program handle
- binary buffer + typed view descriptor → typed accessor

Changed shader sources are picked up by an amortized, frame-ticked
scheduler that does one bounded unit of work per frame.

## Architecture

- **ResourceManager**: owns every cache, exposed to the renderer
- **GraphicsBackend**: compile/link trait implemented by the graphics backend
- **FileSystem**: file reads and modification times (real or in-memory)
- **VariantCache**: generic get-or-create map shared by all caches
- **HotReloadScheduler**: UnmarkStages → UpdateStages → UpdateVariants state machine
*/

// Internal modules
mod error;
mod config;
mod diagnostics;
pub mod log;
pub mod backend;
pub mod fs;
pub mod utils;
pub mod shader;
pub mod resource;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::config::{ResourceManagerConfig, DEFAULT_VERSION_LINE};

    // Diagnostics channel
    pub use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};

    // Resource manager (main entry point)
    pub use crate::resource::ResourceManager;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, set_logger, reset_logger};
    }

    // Backend boundary
    pub mod backend {
        pub use crate::backend::*;
    }

    // Filesystem boundary
    pub mod fs {
        pub use crate::fs::*;
    }

    // Shader sub-module
    pub mod shader {
        pub use crate::shader::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Cache infrastructure
    pub mod utils {
        pub use crate::utils::*;
    }
}

// Re-export math library at crate root
pub use glam;
