//! Generation settings chosen by the user and carried into prompt composition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shortest target duration accepted, in seconds.
pub const MIN_DURATION_SECS: u32 = 5;

/// Longest target duration accepted, in seconds.
pub const MAX_DURATION_SECS: u32 = 60;

/// Reduce a label to lowercase alphanumerics so "Stop-motion", "stop motion"
/// and "STOPMOTION" compare equal.
fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Declares a closed set of options with a user-facing label, used for
/// `Display`, serde, and case-insensitive `FromStr`.
macro_rules! labeled_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $label)] $variant,)+
        }

        impl $name {
            /// Every option, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The user-facing label.
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let wanted = normalize_label(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|option| normalize_label(option.label()) == wanted)
                    .ok_or_else(|| {
                        let known: Vec<&str> = Self::ALL.iter().map(|o| o.label()).collect();
                        Error::InvalidConfig(format!(
                            "unknown {} '{}' (expected one of: {})",
                            $what,
                            s,
                            known.join(", ")
                        ))
                    })
            }
        }
    };
}

labeled_enum! {
    /// Visual style of the generated video.
    VideoStyle, "style" {
        Default => "Default",
        Cinematic => "Cinematic",
        Animation => "Animation",
        Documentary => "Documentary",
        Vibrant => "Vibrant",
        /// Cinematic-trailer variant; enables genre, keywords and intro.
        Hollywood => "Hollywood",
        StopMotion => "Stop-motion",
        Abstract => "Abstract",
    }
}

labeled_enum! {
    /// Resolution tier. The generator cannot be parameterized with it, so it
    /// is stated in the prompt text (and noted in the logs).
    VideoQuality, "quality" {
        Sd480 => "480p",
        Hd720 => "720p",
        FullHd1080 => "1080p",
    }
}

labeled_enum! {
    AspectRatio, "aspect ratio" {
        Landscape => "16:9",
        Portrait => "9:16",
        Square => "1:1",
        Classic => "4:3",
        ClassicPortrait => "3:4",
    }
}

labeled_enum! {
    FrameRate, "frame rate" {
        Fps24 => "24fps",
        Fps30 => "30fps",
        Fps60 => "60fps",
    }
}

labeled_enum! {
    /// Narrative genre, only meaningful for [`VideoStyle::Hollywood`].
    Genre, "genre" {
        None => "None",
        Action => "Action",
        SciFi => "Sci-Fi",
        Drama => "Drama",
        Thriller => "Thriller",
        EpicFantasy => "Epic Fantasy",
    }
}

labeled_enum! {
    /// Transition between scenes.
    ///
    /// [`Transition::None`] means "produce one independent clip per slide",
    /// any other value produces a single combined video.
    Transition, "transition" {
        None => "None",
        Fade => "Fade",
        Slide => "Slide",
        Zoom => "Zoom",
    }
}

impl Default for VideoStyle {
    fn default() -> Self {
        Self::Default
    }
}

impl Default for VideoQuality {
    fn default() -> Self {
        Self::Hd720
    }
}

impl Default for AspectRatio {
    fn default() -> Self {
        Self::Landscape
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::Fps30
    }
}

impl Default for Genre {
    fn default() -> Self {
        Self::None
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::None
    }
}

/// Everything the user picked that shapes a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    pub style: VideoStyle,
    pub quality: VideoQuality,
    pub aspect_ratio: AspectRatio,
    pub frame_rate: FrameRate,
    pub genre: Genre,
    /// Free-text keywords appended to cinematic-trailer prompts.
    pub keywords: String,
    pub transition: Transition,
    /// Ask for a spoken voiceover of the narration text.
    pub voiceover: bool,
    /// Prepend a trailer-style montage intro (cinematic-trailer only).
    pub intro: bool,
    /// Target duration in seconds.
    pub duration_secs: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            style: VideoStyle::default(),
            quality: VideoQuality::default(),
            aspect_ratio: AspectRatio::default(),
            frame_rate: FrameRate::default(),
            genre: Genre::default(),
            keywords: String::new(),
            transition: Transition::default(),
            voiceover: true,
            intro: false,
            duration_secs: 15,
        }
    }
}

impl GenerationConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: VideoStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_quality(mut self, quality: VideoQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: FrameRate) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_genre(mut self, genre: Genre) -> Self {
        self.genre = genre;
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.transition = transition;
        self
    }

    pub fn with_voiceover(mut self, voiceover: bool) -> Self {
        self.voiceover = voiceover;
        self
    }

    pub fn with_intro(mut self, intro: bool) -> Self {
        self.intro = intro;
        self
    }

    pub fn with_duration_secs(mut self, secs: u32) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Whether the cinematic-trailer template applies.
    pub fn is_cinematic_trailer(&self) -> bool {
        self.style == VideoStyle::Hollywood
    }

    /// Whether a single combined video is requested instead of one clip per slide.
    pub fn is_combined(&self) -> bool {
        self.transition != Transition::None
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.duration_secs) {
            return Err(Error::InvalidConfig(format!(
                "duration must be between {} and {} seconds, got {}",
                MIN_DURATION_SECS, MAX_DURATION_SECS, self.duration_secs
            )));
        }
        Ok(())
    }
}
