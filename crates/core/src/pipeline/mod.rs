pub mod encode_reference_use_case;
pub mod scan_video_use_case;
