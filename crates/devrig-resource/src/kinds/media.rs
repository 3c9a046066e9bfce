//! Video and audio capture devices.

use devrig_udev::DeviceSnapshot;

/// A USB video capture device.
///
/// Only capture-capable video4linux nodes qualify; a camera typically also
/// exposes metadata nodes that must not be bound. The filter parses the
/// colon-separated `ID_V4L_CAPABILITIES` property. A missing capability
/// string counts as a non-match, not an error.
#[derive(Debug, Default)]
pub struct Video;

impl Video {
    /// Create a video-capture family.
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn filter_match(&self, snapshot: &DeviceSnapshot) -> bool {
        snapshot
            .property("ID_V4L_CAPABILITIES")
            .is_some_and(|capabilities| capabilities.split(':').any(|cap| cap == "capture"))
    }
}

/// One ALSA capture channel on a USB audio device.
///
/// A sound card exposes one PCM node per direction and device number; the
/// `index` picks the capture channel, checked against the `D{index}c`
/// suffix of the kernel node name.
#[derive(Debug, Default)]
pub struct AudioInput {
    index: u32,
}

impl AudioInput {
    /// Create an audio-input family for the given ALSA PCM device number.
    pub fn new(index: u32) -> Self {
        Self { index }
    }

    /// ALSA PCM device number (the `DEV` in `hw:CARD=<card>,DEV=<index>`).
    pub fn index(&self) -> u32 {
        self.index
    }

    /// ALSA device name for the bound channel, e.g. `hw:CARD=3,DEV=0`.
    ///
    /// The card number is taken from the `number` attribute of the sound
    /// card - the bound node's parent. `None` while unbound or when the
    /// parent was not recorded.
    pub fn alsa_name(&self, device: &DeviceSnapshot) -> Option<String> {
        let card: u32 = device.parent()?.attribute("number")?.trim().parse().ok()?;
        Some(format!("hw:CARD={card},DEV={}", self.index))
    }

    pub(crate) fn filter_match(&self, snapshot: &DeviceSnapshot) -> bool {
        snapshot.sys_name.ends_with(&format!("D{}c", self.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devrig_udev::{DeviceData, HotplugAction};

    #[test]
    fn video_filter_requires_the_capture_capability() {
        let video = Video::new();

        let capture = DeviceSnapshot::new(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-6/video4linux/video0")
                .with_property("ID_V4L_CAPABILITIES", ":capture:"),
        );
        assert!(video.filter_match(&capture));

        let metadata_node = DeviceSnapshot::new(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-6/video4linux/video1")
                .with_property("ID_V4L_CAPABILITIES", ":"),
        );
        assert!(!video.filter_match(&metadata_node));

        let missing = DeviceSnapshot::new(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-6/video4linux/video2"),
        );
        assert!(!video.filter_match(&missing));
    }

    #[test]
    fn audio_filter_checks_the_channel_suffix() {
        let input = AudioInput::new(0);

        let capture = DeviceSnapshot::new(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-5/sound/card3/pcmC3D0c"),
        );
        assert!(input.filter_match(&capture));

        // Playback channel of the same card.
        let playback = DeviceSnapshot::new(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-5/sound/card3/pcmC3D0p"),
        );
        assert!(!input.filter_match(&playback));

        // Different PCM device number.
        assert!(!AudioInput::new(1).filter_match(&capture));
    }

    #[test]
    fn alsa_name_derives_from_the_parent_card_number() {
        let input = AudioInput::new(0);
        let snapshot = DeviceSnapshot::builder(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-5/sound/card3/pcmC3D0c"),
        )
        .ancestor(
            DeviceData::new("/sys/devices/usb1/1-5/sound/card3").with_attribute("number", "3"),
        )
        .build();

        assert_eq!(input.alsa_name(&snapshot).as_deref(), Some("hw:CARD=3,DEV=0"));

        let orphan = DeviceSnapshot::new(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-5/sound/card3/pcmC3D0c"),
        );
        assert_eq!(input.alsa_name(&orphan), None);
    }
}
