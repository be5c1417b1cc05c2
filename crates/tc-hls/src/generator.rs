//! HLS playlist generation functions.

use super::types::{MasterPlaylist, MediaPlaylist};

/// Generate an HLS master playlist (M3U8) from a [`MasterPlaylist`].
///
/// Output includes `#EXTM3U` header and one `#EXT-X-STREAM-INF` per stream.
pub fn generate_master_playlist(playlist: &MasterPlaylist) -> String {
    let mut out = String::from("#EXTM3U\n");

    for stream in &playlist.streams {
        out.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},CODECS=\"{}\",CHANNELS=\"{}\"\n",
            stream.bandwidth, stream.codecs, stream.channels
        ));
        out.push_str(&stream.uri);
        out.push('\n');
    }

    out
}

/// Generate an HLS media playlist (M3U8) from a [`MediaPlaylist`].
///
/// Output includes:
/// - `#EXTM3U` header
/// - Optional `#EXT-X-PLAYLIST-TYPE:VOD`
/// - `#EXT-X-VERSION`, `#EXT-X-TARGETDURATION`, `#EXT-X-MEDIA-SEQUENCE`
/// - Optional `#EXT-X-MAP` for the initialization segment
/// - `#EXTINF` for each segment
/// - Optional `#EXT-X-ENDLIST`
pub fn generate_media_playlist(playlist: &MediaPlaylist) -> String {
    let mut out = String::from("#EXTM3U\n");

    if playlist.vod {
        out.push_str("#EXT-X-PLAYLIST-TYPE:VOD\n");
    }
    out.push_str("#EXT-X-VERSION:7\n");
    out.push_str(&format!(
        "#EXT-X-TARGETDURATION:{}\n",
        playlist.target_duration
    ));
    out.push_str(&format!(
        "#EXT-X-MEDIA-SEQUENCE:{}\n",
        playlist.media_sequence
    ));

    if let Some(ref init_uri) = playlist.init_segment_uri {
        out.push_str(&format!("#EXT-X-MAP:URI=\"{init_uri}\"\n"));
    }

    for segment in &playlist.segments {
        out.push_str(&format!("#EXTINF:{:.6},\n", segment.duration));
        out.push_str(&segment.uri);
        out.push('\n');
    }

    if playlist.ended {
        out.push_str("#EXT-X-ENDLIST\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Segment, StreamInf};

    #[test]
    fn test_generate_master_playlist() {
        let playlist = MasterPlaylist {
            streams: vec![
                StreamInf {
                    bandwidth: 96000,
                    codecs: "mp4a.40.2".to_string(),
                    channels: 2,
                    uri: "96k.m3u8".to_string(),
                },
                StreamInf {
                    bandwidth: 800000,
                    codecs: "flac".to_string(),
                    channels: 2,
                    uri: "flac_44k.m3u8".to_string(),
                },
            ],
        };

        let m3u8 = generate_master_playlist(&playlist);

        let expected = "\
#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=96000,CODECS=\"mp4a.40.2\",CHANNELS=\"2\"
96k.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000,CODECS=\"flac\",CHANNELS=\"2\"
flac_44k.m3u8
";
        assert_eq!(m3u8, expected);
    }

    #[test]
    fn test_generate_master_playlist_empty() {
        let playlist = MasterPlaylist { streams: vec![] };
        assert_eq!(generate_master_playlist(&playlist), "#EXTM3U\n");
    }

    #[test]
    fn test_media_playlist_format_exact() {
        let playlist = MediaPlaylist {
            target_duration: 3,
            media_sequence: 0,
            segments: vec![
                Segment {
                    duration: 3.0,
                    uri: "96k_0.m4s".to_string(),
                },
                Segment {
                    duration: 1.5,
                    uri: "96k_1.m4s".to_string(),
                },
            ],
            vod: true,
            ended: true,
            init_segment_uri: Some("96k_-1.m4s".to_string()),
        };

        let m3u8 = generate_media_playlist(&playlist);

        let expected = "\
#EXTM3U
#EXT-X-PLAYLIST-TYPE:VOD
#EXT-X-VERSION:7
#EXT-X-TARGETDURATION:3
#EXT-X-MEDIA-SEQUENCE:0
#EXT-X-MAP:URI=\"96k_-1.m4s\"
#EXTINF:3.000000,
96k_0.m4s
#EXTINF:1.500000,
96k_1.m4s
#EXT-X-ENDLIST
";
        assert_eq!(m3u8, expected);
    }

    #[test]
    fn test_generate_media_playlist_open_ended() {
        let playlist = MediaPlaylist {
            target_duration: 4,
            media_sequence: 10,
            segments: vec![Segment {
                duration: 4.0,
                uri: "seg10.m4s".to_string(),
            }],
            vod: false,
            ended: false,
            init_segment_uri: None,
        };

        let m3u8 = generate_media_playlist(&playlist);

        assert!(m3u8.contains("#EXT-X-MEDIA-SEQUENCE:10"));
        assert!(!m3u8.contains("#EXT-X-PLAYLIST-TYPE"));
        assert!(!m3u8.contains("#EXT-X-MAP"));
        assert!(!m3u8.contains("#EXT-X-ENDLIST"));
    }
}
