//! Face-emotion annotation pipeline.
//!
//! Locates faces in camera frames or uploaded images, classifies each face's
//! emotion, and produces either an annotated MJPEG stream or a structured
//! per-face result.

pub mod config;

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod region;
    pub mod resource_resolver;
}

pub mod classification {
    pub mod domain {
        pub mod emotion_classifier;
        pub mod emotion_label;
        pub mod emotion_model;
        pub mod image_normalizer;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod face_locator;
    }
    pub mod infrastructure;
}

pub mod annotation {
    pub mod bitmap_font;
    pub mod frame_annotator;
}

pub mod media {
    pub mod domain {
        pub mod frame_codec;
    }
    pub mod infrastructure;
}

pub mod capture {
    pub mod camera_controller;
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod analyze_upload_use_case;
    pub mod live_annotation_use_case;
    pub mod multipart;
    pub mod pipeline_logger;
    pub mod responses;
}
