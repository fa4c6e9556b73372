// Shared helpers used by the analyzer's directory walk.

pub mod ignore;
