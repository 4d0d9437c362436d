//! Gitdeck parser: turns build-tool output into normalized [`Resource`](gitdeck_core::Resource)s.
//!
//! - [`convert`] maps a structured object onto a closed set of workload shapes
//! - [`images`] walks those shapes to their pod templates and collects images
//! - [`extract`] combines both with metadata read straight from the object
//! - [`rendered`] splits multi-document build output into structured objects

#![forbid(unsafe_code)]

pub mod convert;
pub mod extract;
pub mod images;
pub mod rendered;

pub use convert::{
    convert, Container, ConvertError, CronJobSpec, JobTemplate, PodSpec, PodTemplate, Structured, TemplateSpec, Workload,
    WorkloadKind,
};
pub use extract::{extract, extract_resource};
pub use images::{images_from, pod_template_images};
pub use rendered::{split_rendered, RenderError};
