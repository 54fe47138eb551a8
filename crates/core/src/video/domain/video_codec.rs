use std::fmt;
use std::str::FromStr;

/// Codec used for encoded mask videos.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VideoCodec {
    /// MPEG-4 Part 2 in YUV 4:2:0. Lossy, so edge pixels drift from pure black/white.
    Mpeg4,
    /// PNG intra frames in RGB. Bit-exact; needs an `.avi`, `.mov` or `.mkv` container.
    #[default]
    Png,
}

impl VideoCodec {
    pub const ALL: [VideoCodec; 2] = [VideoCodec::Mpeg4, VideoCodec::Png];

    pub fn name(self) -> &'static str {
        match self {
            VideoCodec::Mpeg4 => "mpeg4",
            VideoCodec::Png => "png",
        }
    }

    pub fn is_lossless(self) -> bool {
        matches!(self, VideoCodec::Png)
    }

    /// Container extension that can carry this codec.
    pub fn container(self) -> &'static str {
        match self {
            VideoCodec::Mpeg4 => "mp4",
            VideoCodec::Png => "avi",
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VideoCodec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|codec| codec.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown codec '{s}', expected one of: mpeg4, png"))
    }
}
