// Attempt profiles for yt-dlp invocation
//
// Each profile is one fixed argument set. The invoker walks the list in order
// and stops at the first attempt whose stdout parses as JSON.

use super::url::is_youtube;

const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const FIREFOX_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0";

const ACCEPT_HEADER: &str = "Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_HEADER: &str = "Accept-Language: en-us,en;q=0.5";
const SEC_FETCH_MODE_HEADER: &str = "Sec-Fetch-Mode: navigate";

/// How the extractor is launched for a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launcher {
    /// The standalone `yt-dlp` executable
    Binary,
    /// `<python> -m yt_dlp`
    PythonModule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptProfile {
    pub name: &'static str,
    pub launcher: Launcher,
    /// Arguments without the trailing URL
    pub args: Vec<String>,
}

impl AttemptProfile {
    fn binary(name: &'static str, args: Vec<String>) -> Self {
        Self {
            name,
            launcher: Launcher::Binary,
            args,
        }
    }

    /// Full argument list for this attempt, URL last.
    pub fn command_args(&self, url: &str) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(url.to_string());
        args
    }

    /// The ordered main cascade for a normalized URL.
    pub fn cascade(url: &str) -> Vec<AttemptProfile> {
        let youtube = is_youtube(url);
        let mut profiles = vec![Self::binary("standard", standard_args())];

        if youtube {
            profiles.push(Self::binary("alternate-agent", alternate_agent_args()));
        }

        profiles.push(Self::binary("minimal", minimal_args()));

        if youtube {
            profiles.push(Self::binary("android-client", player_client_args("android")));
        }

        // Module fallback repeats whatever ran last through the interpreter
        let last_args = profiles
            .last()
            .map(|p| p.args.clone())
            .unwrap_or_else(minimal_args);
        profiles.push(AttemptProfile {
            name: "python-module",
            launcher: Launcher::PythonModule,
            args: last_args,
        });

        profiles
    }

    /// Profiles tried once stderr shows YouTube's sign-in wall.
    pub fn bot_detection_cascade() -> Vec<AttemptProfile> {
        vec![
            Self::binary("ios-client", player_client_args("ios")),
            Self::binary("tv-client", player_client_args("tv")),
        ]
    }
}

fn to_args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn base_args() -> Vec<String> {
    to_args(&["--dump-json", "--no-playlist", "--no-warnings", "--ignore-errors"])
}

fn standard_args() -> Vec<String> {
    let mut args = base_args();
    args.extend(to_args(&[
        "--no-check-certificate",
        "--geo-bypass",
        "--user-agent",
        CHROME_UA,
        "--add-header",
        ACCEPT_HEADER,
        "--add-header",
        ACCEPT_LANGUAGE_HEADER,
        "--add-header",
        SEC_FETCH_MODE_HEADER,
    ]));
    args
}

fn alternate_agent_args() -> Vec<String> {
    let mut args = base_args();
    args.extend(to_args(&[
        "--no-check-certificate",
        "--geo-bypass",
        "--user-agent",
        FIREFOX_UA,
        "--add-header",
        ACCEPT_HEADER,
    ]));
    args
}

fn minimal_args() -> Vec<String> {
    let mut args = base_args();
    args.push("--no-check-certificate".to_string());
    args
}

fn player_client_args(client: &str) -> Vec<String> {
    let mut args = base_args();
    args.push("--extractor-args".to_string());
    args.push(format!("youtube:player_client={}", client));
    args
}
