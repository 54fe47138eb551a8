use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::Rational;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_codec::VideoCodec;
use crate::video::domain::video_writer::VideoWriter;

use super::frame_rate;

/// Encodes RGB frames via ffmpeg-next.
///
/// The output keeps the exact frame size and frame rate from the metadata
/// passed to `open`; the container is chosen from the path extension.
pub struct FfmpegWriter {
    codec: VideoCodec,
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    time_base: Rational,
    frame_count: usize,
    video_stream_index: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self::with_codec(VideoCodec::default())
    }

    pub fn with_codec(codec: VideoCodec) -> Self {
        Self {
            codec,
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            time_base: Rational(1, 30),
            frame_count: 0,
            video_stream_index: 0,
        }
    }

}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn codec_id(codec: VideoCodec) -> ffmpeg_next::codec::Id {
    match codec {
        VideoCodec::Mpeg4 => ffmpeg_next::codec::Id::MPEG4,
        VideoCodec::Png => ffmpeg_next::codec::Id::PNG,
    }
}

fn pixel_format(codec: VideoCodec) -> Pixel {
    match codec {
        VideoCodec::Mpeg4 => Pixel::YUV420P,
        VideoCodec::Png => Pixel::RGB24,
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let (num, den) = frame_rate::to_fraction(metadata.fps)
            .ok_or_else(|| format!("unsupported frame rate {}", metadata.fps))?;
        let frame_rate = Rational(num, den);
        let time_base = frame_rate.invert();
        let format = pixel_format(self.codec);

        let mut octx = ffmpeg_next::format::output(path)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(codec_id(self.codec))
            .ok_or_else(|| format!("{} encoder not found", self.codec))?;

        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(format);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(frame_rate));

        // Bit-exact output keeps repeated runs byte-identical.
        let mut flags = ffmpeg_next::codec::Flags::BITEXACT;
        if global_header {
            flags |= ffmpeg_next::codec::Flags::GLOBAL_HEADER;
        }
        encoder_ctx.set_flags(flags);

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        ost.set_time_base(time_base);
        ost.set_rate(frame_rate);
        ost.set_avg_frame_rate(frame_rate);
        self.video_stream_index = ost.index();

        let mut muxer_options = ffmpeg_next::Dictionary::new();
        muxer_options.set("fflags", "+bitexact");
        octx.write_header_with(muxer_options)?;

        // Only YUV codecs need a colorspace conversion.
        let scaler = if format == Pixel::RGB24 {
            None
        } else {
            Some(ffmpeg_next::software::scaling::Context::get(
                Pixel::RGB24,
                metadata.width,
                metadata.height,
                format,
                metadata.width,
                metadata.height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )?)
        };

        self.width = metadata.width;
        self.height = metadata.height;
        self.time_base = time_base;
        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = scaler;
        self.frame_count = 0;

        log::debug!(
            "Opened {} writer for {} ({}x{} @ {num}/{den} fps)",
            self.codec,
            path.display(),
            metadata.width,
            metadata.height
        );

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(encoder), Some(octx)) = (self.encoder.as_mut(), self.octx.as_mut()) else {
            return Err("FfmpegWriter: not opened".into());
        };
        if frame.width() != self.width || frame.height() != self.height || frame.channels() != 3 {
            return Err(format!(
                "frame is {}x{}x{}, writer expects {}x{}x3",
                frame.width(),
                frame.height(),
                frame.channels(),
                self.width,
                self.height
            )
            .into());
        }

        let mut rgb_frame =
            ffmpeg_next::util::frame::video::Video::new(Pixel::RGB24, self.width, self.height);
        copy_rgb_rows(frame.data(), &mut rgb_frame, self.width, self.height);

        let mut encoded_frame = match self.scaler.as_mut() {
            Some(scaler) => {
                let mut converted = ffmpeg_next::util::frame::video::Video::empty();
                scaler.run(&rgb_frame, &mut converted)?;
                converted
            }
            None => rgb_frame,
        };
        encoded_frame.set_pts(Some(self.frame_count as i64));

        encoder.send_frame(&encoded_frame)?;
        drain_packets(encoder, octx, self.video_stream_index, self.time_base)?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let encoder = self.encoder.take();
        let octx = self.octx.take();
        self.scaler = None;

        if let (Some(mut encoder), Some(mut octx)) = (encoder, octx) {
            encoder.send_eof()?;
            drain_packets(&mut encoder, &mut octx, self.video_stream_index, self.time_base)?;
            octx.write_trailer()?;
            log::debug!("Flushed {} frames", self.frame_count);
        }

        Ok(())
    }
}

/// Moves every packet the encoder has ready into the output container.
fn drain_packets(
    encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    time_base: Rational,
) -> Result<(), ffmpeg_next::Error> {
    let ost_time_base = octx
        .stream(stream_index)
        .map(|s| s.time_base())
        .unwrap_or(time_base);

    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_index);
        encoded.rescale_ts(time_base, ost_time_base);
        encoded.write_interleaved(octx)?;
    }
    Ok(())
}

/// Copies tightly packed RGB rows into an ffmpeg frame, respecting its stride.
fn copy_rgb_rows(
    src: &[u8],
    dst: &mut ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) {
    let stride = dst.stride(0);
    let row_bytes = width as usize * 3;
    let data = dst.data_mut(0);
    for row in 0..height as usize {
        let src_start = row * row_bytes;
        let dst_start = row * stride;
        data[dst_start..dst_start + row_bytes]
            .copy_from_slice(&src[src_start..src_start + row_bytes]);
    }
}
