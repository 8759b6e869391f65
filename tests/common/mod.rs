#![allow(dead_code)]

pub use projwatch_test_utils::builders::{fast_timing, MockProject, MockProjectBuilder};
pub use projwatch_test_utils::recorders::{SignalRecorder, TreeRecorder};
pub use projwatch_test_utils::{init_tracing, wait_until, with_timeout};

/// `/proj` containing `a.gltf` and `b.txt`.
pub fn gltf_and_txt() -> MockProject {
    MockProjectBuilder::new("/proj")
        .file("a.gltf", 1)
        .file("b.txt", 2)
        .build()
}
