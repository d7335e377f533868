use rand::seq::SliceRandom;

use super::ClientOrigin;

pub mod yt_ua {
    pub const IOS: &str =
        "com.google.ios.youtube/21.02.1 (iPhone16,2; U; CPU iOS 18_2 like Mac OS X;)";
    pub const ANDROID: &str = "com.google.android.youtube/20.01.35 (Linux; U; Android 14) identity";
    pub const TVHTML5: &str = "Mozilla/5.0 (SmartHub; SMART-TV; U; Linux/SmartTV; Maple2012) \
         AppleWebKit/534.7 (KHTML, like Gecko) SmartTV Safari/534.7";
    pub const TV_EMBEDDED: &str = "Mozilla/5.0 (Linux armeabi-v7a; Android 7.1.2; Fire OS 6.0) \
         Cobalt/22.lts.3.306369-gold (unlike Gecko) v8/8.8.278.8-jit gles Starboard/13";
    pub const MWEB: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 18_2 like Mac OS X) \
         AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.0 Mobile/15E148 Safari/604.1";
    pub const WEB: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
         AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";
    pub const WEB_EMBEDDED: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";
}

const IOS_POOL: &[&str] = &[
    yt_ua::IOS,
    "com.google.ios.youtube/20.49.4 (iPhone17,1; U; CPU iOS 18_1_1 like Mac OS X;)",
    "com.google.ios.youtube/20.45.2 (iPad14,3; U; CPU iPadOS 17_6 like Mac OS X;)",
];

const ANDROID_POOL: &[&str] = &[
    yt_ua::ANDROID,
    "com.google.android.youtube/19.44.38 (Linux; U; Android 13) gzip",
    "com.google.android.youtube/20.10.38 (Linux; U; Android 15; en_US; Pixel 9) gzip",
];

const TV_POOL: &[&str] = &[
    yt_ua::TVHTML5,
    yt_ua::TV_EMBEDDED,
    "Mozilla/5.0 (Linux; Tizen 6.5) AppleWebKit/537.36 (KHTML, like Gecko) \
     76.0.3809.146/6.5 TV Safari/537.36",
];

const DESKTOP_POOL: &[&str] = &[
    yt_ua::WEB,
    yt_ua::WEB_EMBEDDED,
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_7_1) AppleWebKit/605.1.15 \
     (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Device family a stream URL was issued to. Googlevideo checks that the
/// downloading User-Agent roughly matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentClass {
    Ios,
    Android,
    Tv,
    Desktop,
}

impl AgentClass {
    pub fn from_origin(origin: ClientOrigin) -> Self {
        match origin {
            ClientOrigin::Ios => Self::Ios,
            ClientOrigin::Android => Self::Android,
            ClientOrigin::Tv | ClientOrigin::TvEmbedded => Self::Tv,
            _ => Self::Desktop,
        }
    }

    fn pool(&self) -> &'static [&'static str] {
        match self {
            Self::Ios => IOS_POOL,
            Self::Android => ANDROID_POOL,
            Self::Tv => TV_POOL,
            Self::Desktop => DESKTOP_POOL,
        }
    }

    pub fn random_user_agent(&self) -> &'static str {
        self.pool()
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(yt_ua::WEB)
    }
}
