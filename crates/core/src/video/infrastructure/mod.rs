pub mod ffmpeg_reader;
pub mod ffmpeg_writer;
mod frame_rate;
pub mod image_file_writer;
