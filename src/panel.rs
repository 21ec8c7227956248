//! Panel controller: the mixer and link widgets for one Krad station.
//!
//! The panel model is the only state. Every mutation also queues a
//! [`ViewUpdate`] addressed by a deterministic element id, so browsers can
//! follow along without re-rendering the whole station.

use crate::connection::CommandSink;
use crate::protocol::{
    self, Command, Inbound, Link, LinkControl, LinkEvent, MixerEvent, ProtocolError, RadioInfo,
};
use crate::ui;
use serde::Serialize;

pub const VOLUME_CONTROL: &str = "volume";
pub const CROSSFADE_CONTROL: &str = "crossfade";

const VOLUME_RANGE: (i64, i64) = (0, 100);
const CROSSFADE_RANGE: (i64, i64) = (-100, 100);
const OPUS_BITRATE_RANGE: (i64, i64) = (3000, 320000);
const OPUS_COMPLEXITY_RANGE: (i64, i64) = (0, 10);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Slider {
    pub id: String,
    pub orientation: Orientation,
    pub min: i64,
    pub max: i64,
    pub value: i64,
}

impl Slider {
    fn new(id: String, orientation: Orientation, (min, max): (i64, i64), value: f64) -> Self {
        let mut slider = Self {
            id,
            orientation,
            min,
            max,
            value: min,
        };
        slider.set_value(value);
        slider
    }

    /// Clamps into range and snaps to whole steps. Returns the stored value.
    pub fn set_value(&mut self, value: f64) -> i64 {
        self.value = if value.is_finite() {
            (value.round() as i64).clamp(self.min, self.max)
        } else {
            self.min
        };
        self.value
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Crossfade {
    pub label: String,
    pub slider: Slider,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Portgroup {
    pub name: String,
    pub volume: Slider,
    pub crossfade: Option<Crossfade>,
}

impl Portgroup {
    pub fn volume_control_id(&self) -> String {
        volume_control_id(&self.name)
    }

    pub fn crossfade_control_id(&self) -> String {
        crossfade_control_id(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OpusControls {
    pub frame_size: Option<i64>,
    pub bitrate: Slider,
    pub bitrate_label: String,
    pub complexity: Slider,
    pub complexity_label: String,
}

impl OpusControls {
    fn slider_mut(&mut self, control: LinkControl) -> (&mut Slider, &str) {
        match control {
            LinkControl::OpusBitrate => (&mut self.bitrate, &self.bitrate_label),
            LinkControl::OpusComplexity => (&mut self.complexity, &self.complexity_label),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinkView {
    pub link: Link,
    pub opus: Option<OpusControls>,
}

impl LinkView {
    fn new(link: Link) -> Self {
        let opus = link.has_opus_controls().then(|| {
            let n = link.link_num;
            OpusControls {
                frame_size: link.opus_frame_size,
                bitrate: Slider::new(
                    format!("link_{n}_opus_bitrate_slider"),
                    Orientation::Vertical,
                    OPUS_BITRATE_RANGE,
                    link.opus_bitrate.unwrap_or(OPUS_BITRATE_RANGE.0) as f64,
                ),
                bitrate_label: format!("link_{n}_opus_bitrate_value"),
                complexity: Slider::new(
                    format!("link_{n}_opus_complexity_slider"),
                    Orientation::Vertical,
                    OPUS_COMPLEXITY_RANGE,
                    link.opus_complexity.unwrap_or(OPUS_COMPLEXITY_RANGE.1) as f64,
                ),
                complexity_label: format!("link_{n}_opus_complexity_value"),
            }
        });
        Self { link, opus }
    }

    pub fn id(&self) -> String {
        link_id(self.link.link_num)
    }
}

/// A change to the rendered panel, addressed by element id.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ViewUpdate {
    Mount {
        parent: Option<String>,
        id: String,
        html: String,
    },
    SetValue {
        id: String,
        value: i64,
    },
    SetText {
        id: String,
        text: String,
    },
    Remove {
        id: String,
    },
    Reset {
        html: String,
    },
}

pub fn volume_control_id(name: &str) -> String {
    format!("{name}_volume_control")
}

pub fn crossfade_slider_id(name: &str) -> String {
    format!("{name}_crossfade")
}

pub fn crossfade_control_id(name: &str) -> String {
    format!("{name}_crossfade_control")
}

pub fn link_id(link_num: u32) -> String {
    format!("link_{link_num}")
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Panel {
    pub sysname: Option<String>,
    pub portgroups: Vec<Portgroup>,
    pub links: Vec<LinkView>,
    #[serde(skip)]
    pending: Vec<ViewUpdate>,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mixer_id(&self) -> Option<String> {
        self.sysname.as_ref().map(|s| format!("{s}_kradmixer"))
    }

    pub fn link_area_id(&self) -> Option<String> {
        self.sysname.as_ref().map(|s| format!("{s}_kradlink"))
    }

    pub fn portgroup(&self, name: &str) -> Option<&Portgroup> {
        self.portgroups.iter().find(|pg| pg.name == name)
    }

    #[cfg(test)]
    pub fn link(&self, link_num: u32) -> Option<&LinkView> {
        self.links.iter().find(|l| l.link.link_num == link_num)
    }

    /// Looks a slider up by its element id.
    #[cfg(test)]
    pub fn slider(&self, id: &str) -> Option<&Slider> {
        let portgroup_sliders = self.portgroups.iter().flat_map(|pg| {
            std::iter::once(&pg.volume).chain(pg.crossfade.as_ref().map(|c| &c.slider))
        });
        let link_sliders = self
            .links
            .iter()
            .filter_map(|l| l.opus.as_ref())
            .flat_map(|o| [&o.bitrate, &o.complexity]);
        portgroup_sliders
            .chain(link_sliders)
            .find(|slider| slider.id == id)
    }

    /// Every element id the rendered station would contain.
    #[cfg(test)]
    pub fn element_ids(&self) -> Vec<String> {
        let Some(sysname) = &self.sysname else {
            return Vec::new();
        };
        let mut ids = vec![sysname.clone()];
        ids.extend(self.mixer_id());
        ids.extend(self.link_area_id());
        for pg in &self.portgroups {
            ids.push(pg.volume_control_id());
            ids.push(pg.volume.id.clone());
            if let Some(crossfade) = &pg.crossfade {
                ids.push(pg.crossfade_control_id());
                ids.push(crossfade.slider.id.clone());
            }
        }
        for link in &self.links {
            ids.push(link.id());
            if let Some(opus) = &link.opus {
                ids.push(opus.bitrate_label.clone());
                ids.push(opus.bitrate.id.clone());
                ids.push(opus.complexity_label.clone());
                ids.push(opus.complexity.id.clone());
            }
        }
        ids
    }

    pub fn take_updates(&mut self) -> Vec<ViewUpdate> {
        std::mem::take(&mut self.pending)
    }

    fn is_mounted(&self) -> bool {
        self.sysname.is_some()
    }

    fn push(&mut self, update: ViewUpdate) {
        if self.is_mounted() {
            self.pending.push(update);
        }
    }

    pub fn got_sysname(&mut self, name: &str) {
        if self.sysname.as_deref() == Some(name) {
            tracing::debug!("Station {name} already mounted");
            return;
        }
        if let Some(previous) = self.sysname.take() {
            tracing::warn!("Station renamed from {previous} to {name}");
            self.pending.push(ViewUpdate::Remove { id: previous });
        }
        self.sysname = Some(name.to_string());
        tracing::info!("Mounting station {name}");
        let html = ui::render_station(self);
        self.push(ViewUpdate::Mount {
            parent: None,
            id: name.to_string(),
            html,
        });
    }

    /// Applies a raw frame of server notifications. Returns how many were
    /// understood.
    pub fn got_messages(&mut self, raw: &str) -> Result<usize, ProtocolError> {
        let messages = protocol::parse_batch(raw)?;
        let applied = messages.len();
        for msg in messages {
            self.apply(msg);
        }
        Ok(applied)
    }

    pub fn apply(&mut self, msg: Inbound) {
        match msg {
            Inbound::Radio(RadioInfo::Sysname { infoval }) => self.got_sysname(&infoval),
            Inbound::Mixer(MixerEvent::AddPortgroup {
                portgroup_name,
                volume,
                crossfade_name,
                crossfade,
            }) => self.got_add_portgroup(&portgroup_name, volume, &crossfade_name, crossfade),
            Inbound::Mixer(MixerEvent::UpdatePortgroup {
                portgroup_name,
                control_name,
                value,
            }) => self.got_update_portgroup(&portgroup_name, &control_name, value),
            Inbound::Mixer(MixerEvent::RemovePortgroup { portgroup_name }) => {
                self.got_remove_portgroup(&portgroup_name)
            }
            Inbound::Link(LinkEvent::AddLink(link)) => self.got_add_link(link),
        }
    }

    pub fn got_add_portgroup(
        &mut self,
        name: &str,
        volume: f64,
        crossfade_name: &str,
        crossfade: f64,
    ) {
        if self.portgroup(name).is_some() {
            tracing::debug!("Replacing portgroup {name}");
            self.got_remove_portgroup(name);
        }

        let portgroup = Portgroup {
            name: name.to_string(),
            volume: Slider::new(
                name.to_string(),
                Orientation::Vertical,
                VOLUME_RANGE,
                volume,
            ),
            crossfade: (!crossfade_name.is_empty()).then(|| Crossfade {
                label: format!("{name} - {crossfade_name}"),
                slider: Slider::new(
                    crossfade_slider_id(name),
                    Orientation::Horizontal,
                    CROSSFADE_RANGE,
                    crossfade,
                ),
            }),
        };

        if let Some(parent) = self.mixer_id() {
            self.push(ViewUpdate::Mount {
                parent: Some(parent.clone()),
                id: portgroup.volume_control_id(),
                html: ui::render_volume_control(&portgroup),
            });
            if portgroup.crossfade.is_some() {
                self.push(ViewUpdate::Mount {
                    parent: Some(parent),
                    id: portgroup.crossfade_control_id(),
                    html: ui::render_crossfade_control(&portgroup),
                });
            }
        }
        self.portgroups.push(portgroup);
    }

    pub fn got_update_portgroup(&mut self, name: &str, control_name: &str, value: f64) {
        tracing::debug!("Update portgroup {name} {control_name} {value}");
        let Some(pg) = self.portgroups.iter_mut().find(|pg| pg.name == name) else {
            tracing::debug!("No portgroup named {name}");
            return;
        };
        let slider = if control_name == VOLUME_CONTROL {
            &mut pg.volume
        } else {
            match pg.crossfade.as_mut() {
                Some(crossfade) => &mut crossfade.slider,
                None => return,
            }
        };
        let value = slider.set_value(value);
        let id = slider.id.clone();
        self.push(ViewUpdate::SetValue { id, value });
    }

    pub fn got_remove_portgroup(&mut self, name: &str) {
        let Some(index) = self.portgroups.iter().position(|pg| pg.name == name) else {
            tracing::debug!("No portgroup named {name} to remove");
            return;
        };
        let pg = self.portgroups.remove(index);
        self.push(ViewUpdate::Remove {
            id: pg.volume_control_id(),
        });
        if pg.crossfade.is_some() {
            self.push(ViewUpdate::Remove {
                id: pg.crossfade_control_id(),
            });
        }
    }

    pub fn got_add_link(&mut self, link: Link) {
        let view = LinkView::new(link);
        if let Some(index) = self.links.iter().position(|l| l.id() == view.id()) {
            tracing::debug!("Replacing link {}", view.link.link_num);
            let old = self.links.remove(index);
            self.push(ViewUpdate::Remove { id: old.id() });
        }
        if let Some(parent) = self.link_area_id() {
            self.push(ViewUpdate::Mount {
                parent: Some(parent),
                id: view.id(),
                html: ui::render_link(&view),
            });
        }
        self.links.push(view);
    }

    /// Mirrors a user's slider move and forwards it to the mixer.
    pub fn update_portgroup(
        &mut self,
        sink: &mut impl CommandSink,
        name: &str,
        control_name: &str,
        value: i64,
    ) {
        let slider = self
            .portgroups
            .iter_mut()
            .find(|pg| pg.name == name)
            .and_then(|pg| {
                if control_name == VOLUME_CONTROL {
                    Some(&mut pg.volume)
                } else {
                    pg.crossfade.as_mut().map(|c| &mut c.slider)
                }
            });
        let mut value = value;
        if let Some(slider) = slider {
            value = slider.set_value(value as f64);
            let id = slider.id.clone();
            self.push(ViewUpdate::SetValue { id, value });
        }
        sink.send_command(&Command::update_portgroup(name, control_name, value));
    }

    pub fn update_link(
        &mut self,
        sink: &mut impl CommandSink,
        link_num: u32,
        control: LinkControl,
        value: i64,
    ) {
        let opus = self
            .links
            .iter_mut()
            .find(|l| l.link.link_num == link_num)
            .and_then(|l| l.opus.as_mut());
        let mut value = value;
        if let Some(opus) = opus {
            let (slider, label) = opus.slider_mut(control);
            value = slider.set_value(value as f64);
            let (id, label) = (slider.id.clone(), label.to_string());
            self.push(ViewUpdate::SetValue { id, value });
            self.push(ViewUpdate::SetText {
                id: label,
                text: value.to_string(),
            });
        }
        sink.send_command(&Command::update_link(link_num, control, value));
    }

    pub fn destroy(&mut self) {
        if let Some(sysname) = &self.sysname {
            tracing::info!("Removing station {sysname}");
            let id = sysname.clone();
            self.push(ViewUpdate::Remove { id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{AvMode, OperationMode};
    use serde_json::json;

    #[derive(Default)]
    struct Recorder(Vec<Command>);

    impl CommandSink for Recorder {
        fn send_command(&mut self, command: &Command) {
            self.0.push(command.clone());
        }
    }

    fn mounted() -> Panel {
        let mut panel = Panel::new();
        panel.got_sysname("studio");
        panel.take_updates();
        panel
    }

    fn opus_link(link_num: u32) -> Link {
        Link {
            link_num,
            operation_mode: OperationMode::Transmit,
            av_mode: AvMode::AudioAndVideo,
            video_source: None,
            host: Some("stream.example".into()),
            port: Some(8080),
            mount: Some("/station.webm".into()),
            video_codec: Some("VP8".into()),
            audio_codec: Some("Opus".into()),
            opus_frame_size: Some(960),
            opus_bitrate: Some(96000),
            opus_complexity: Some(7),
        }
    }

    #[test]
    fn sysname_mounts_root_once() {
        let mut panel = Panel::new();
        panel.got_sysname("studio");
        panel.got_sysname("studio");
        let updates = panel.take_updates();
        assert_eq!(updates.len(), 1);
        match &updates[0] {
            ViewUpdate::Mount { parent, id, html } => {
                assert_eq!(parent, &None);
                assert_eq!(id, "studio");
                assert!(html.contains("studio_kradmixer"));
                assert!(html.contains("studio_kradlink"));
            }
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[test]
    fn renamed_station_replaces_root() {
        let mut panel = mounted();
        panel.got_sysname("backup");
        let updates = panel.take_updates();
        assert_eq!(updates[0], ViewUpdate::Remove { id: "studio".into() });
        assert!(matches!(&updates[1], ViewUpdate::Mount { id, .. } if id == "backup"));
    }

    #[test]
    fn portgroup_gets_volume_and_optional_crossfade() {
        let mut panel = mounted();
        panel.got_add_portgroup("Mic", 80.0, "", 0.0);
        panel.got_add_portgroup("Music", 60.0, "Deck B", -25.0);

        let mic = panel.portgroup("Mic").unwrap();
        assert_eq!(mic.volume.id, "Mic");
        assert_eq!(mic.volume.value, 80);
        assert_eq!(mic.volume.orientation, Orientation::Vertical);
        assert!(mic.crossfade.is_none());

        let music = panel.portgroup("Music").unwrap();
        let crossfade = music.crossfade.as_ref().unwrap();
        assert_eq!(crossfade.slider.id, "Music_crossfade");
        assert_eq!((crossfade.slider.min, crossfade.slider.max), (-100, 100));
        assert_eq!(crossfade.slider.value, -25);
        assert_eq!(crossfade.label, "Music - Deck B");

        let mounts: Vec<_> = panel
            .take_updates()
            .into_iter()
            .filter_map(|u| match u {
                ViewUpdate::Mount { parent, id, .. } => Some((parent, id)),
                _ => None,
            })
            .collect();
        let mixer = Some("studio_kradmixer".to_string());
        assert_eq!(
            mounts,
            vec![
                (mixer.clone(), "Mic_volume_control".to_string()),
                (mixer.clone(), "Music_volume_control".to_string()),
                (mixer, "Music_crossfade_control".to_string()),
            ]
        );
    }

    #[test]
    fn readding_portgroup_keeps_ids_unique() {
        let mut panel = mounted();
        panel.got_add_portgroup("Mic", 80.0, "", 0.0);
        panel.got_add_portgroup("Mic", 20.0, "", 0.0);
        assert_eq!(panel.portgroups.len(), 1);
        assert_eq!(panel.slider("Mic").unwrap().value, 20);
    }

    #[test]
    fn server_updates_target_the_right_slider() {
        let mut panel = mounted();
        panel.got_add_portgroup("Music", 60.0, "Deck B", 0.0);
        panel.take_updates();

        panel.got_update_portgroup("Music", "volume", 33.0);
        panel.got_update_portgroup("Music", "crossfade", 45.0);
        assert_eq!(panel.slider("Music").unwrap().value, 33);
        assert_eq!(panel.slider("Music_crossfade").unwrap().value, 45);
        assert_eq!(
            panel.take_updates(),
            vec![
                ViewUpdate::SetValue { id: "Music".into(), value: 33 },
                ViewUpdate::SetValue { id: "Music_crossfade".into(), value: 45 },
            ]
        );

        panel.got_update_portgroup("Nobody", "volume", 10.0);
        assert!(panel.take_updates().is_empty());
    }

    #[test]
    fn slider_values_are_clamped() {
        let mut panel = mounted();
        panel.got_add_portgroup("Mic", 140.0, "Aux", -300.0);
        assert_eq!(panel.slider("Mic").unwrap().value, 100);
        assert_eq!(panel.slider("Mic_crossfade").unwrap().value, -100);
    }

    #[test]
    fn remove_touches_only_that_portgroup() {
        let mut panel = mounted();
        panel.got_add_portgroup("Mic", 80.0, "", 0.0);
        panel.got_add_portgroup("Music", 60.0, "Deck B", 0.0);
        let before = panel.element_ids();
        panel.take_updates();

        panel.got_remove_portgroup("Music");
        let after = panel.element_ids();
        let removed: Vec<_> = before.iter().filter(|id| !after.contains(id)).collect();
        assert_eq!(
            removed,
            vec!["Music_volume_control", "Music", "Music_crossfade_control", "Music_crossfade"]
        );
        assert_eq!(
            panel.take_updates(),
            vec![
                ViewUpdate::Remove { id: "Music_volume_control".into() },
                ViewUpdate::Remove { id: "Music_crossfade_control".into() },
            ]
        );
        assert!(panel.portgroup("Mic").is_some());
    }

    #[test]
    fn opus_link_gets_bitrate_and_complexity_sliders() {
        let mut panel = mounted();
        panel.got_add_link(opus_link(4));
        let link = panel.link(4).unwrap();
        let opus = link.opus.as_ref().unwrap();
        assert_eq!(opus.bitrate.id, "link_4_opus_bitrate_slider");
        assert_eq!((opus.bitrate.min, opus.bitrate.max), (3000, 320000));
        assert_eq!(opus.bitrate.value, 96000);
        assert_eq!((opus.complexity.min, opus.complexity.max), (0, 10));
        assert_eq!(opus.complexity.value, 7);

        match &panel.take_updates()[0] {
            ViewUpdate::Mount { parent, id, html } => {
                assert_eq!(parent.as_deref(), Some("studio_kradlink"));
                assert_eq!(id, "link_4");
                assert!(html.contains("Opus frame size: 960"));
                assert!(html.contains("http://stream.example:8080/station.webm"));
                assert!(html.contains("VP8"));
            }
            other => panic!("unexpected update {other:?}"),
        }
    }

    #[test]
    fn link_with_float_settings_still_gets_sliders() {
        let mut panel = Panel::new();
        let raw = json!([
            {"com": "kradradio", "info": "sysname", "infoval": "studio"},
            {"com": "kradlink", "cmd": "add_link", "link_num": 1,
             "operation_mode": "transmit", "av_mode": "audio only",
             "host": "example.org", "port": 8000, "mount": "/live.ogg",
             "audio_codec": "Opus", "opus_frame_size": 960,
             "opus_bitrate": 64000.0, "opus_complexity": 10.0}
        ])
        .to_string();

        assert_eq!(panel.got_messages(&raw).unwrap(), 2);
        assert_eq!(panel.links.len(), 1);
        let opus = panel.link(1).unwrap().opus.as_ref().unwrap();
        assert_eq!(opus.bitrate.value, 64000);
        assert_eq!(opus.complexity.value, 10);
    }

    #[test]
    fn non_opus_and_capture_links_have_no_sliders() {
        let mut panel = mounted();
        let mut vorbis = opus_link(1);
        vorbis.audio_codec = Some("Vorbis".into());
        panel.got_add_link(vorbis);

        let mut video = opus_link(2);
        video.av_mode = AvMode::VideoOnly;
        panel.got_add_link(video);

        let mut capture = opus_link(3);
        capture.operation_mode = OperationMode::Capture;
        capture.video_source = Some("/dev/video0".into());
        panel.got_add_link(capture);

        assert!(panel.links.iter().all(|l| l.opus.is_none()));
    }

    #[test]
    fn dragging_opus_slider_sends_once_and_mirrors_label() {
        let mut panel = mounted();
        panel.got_add_link(opus_link(4));
        panel.take_updates();
        let mut sink = Recorder::default();

        panel.update_link(&mut sink, 4, LinkControl::OpusBitrate, 64000);
        assert_eq!(
            sink.0,
            vec![Command::update_link(4, LinkControl::OpusBitrate, 64000)]
        );
        assert_eq!(
            panel.take_updates(),
            vec![
                ViewUpdate::SetValue { id: "link_4_opus_bitrate_slider".into(), value: 64000 },
                ViewUpdate::SetText { id: "link_4_opus_bitrate_value".into(), text: "64000".into() },
            ]
        );

        panel.update_link(&mut sink, 4, LinkControl::OpusComplexity, 3);
        assert_eq!(sink.0.len(), 2);
        assert_eq!(panel.slider("link_4_opus_complexity_slider").unwrap().value, 3);
    }

    #[test]
    fn out_of_range_drag_is_clamped_before_sending() {
        let mut panel = mounted();
        panel.got_add_link(opus_link(4));
        let mut sink = Recorder::default();
        panel.update_link(&mut sink, 4, LinkControl::OpusBitrate, 1000);
        assert_eq!(
            sink.0,
            vec![Command::update_link(4, LinkControl::OpusBitrate, 3000)]
        );
    }

    #[test]
    fn user_volume_change_is_forwarded() {
        let mut panel = mounted();
        panel.got_add_portgroup("Mic", 80.0, "", 0.0);
        panel.take_updates();
        let mut sink = Recorder::default();

        panel.update_portgroup(&mut sink, "Mic", VOLUME_CONTROL, 55);
        assert_eq!(sink.0, vec![Command::update_portgroup("Mic", "volume", 55)]);
        assert_eq!(panel.slider("Mic").unwrap().value, 55);
    }

    #[test]
    fn batch_with_unknown_entry_applies_the_rest() {
        let mut panel = Panel::new();
        let raw = json!([
            {"com": "kradradio", "info": "sysname", "infoval": "studio"},
            {"com": "kradmixer", "cmd": "add_portgroup", "portgroup_name": "Mic",
             "volume": 50, "crossfade_name": "", "crossfade": 0},
            {"com": "kradmixer", "cmd": "mute_portgroup", "portgroup_name": "Mic"},
            {"com": "kradmixer", "cmd": "update_portgroup", "portgroup_name": "Mic",
             "control_name": "volume", "value": 70}
        ])
        .to_string();

        assert_eq!(panel.got_messages(&raw).unwrap(), 3);
        assert_eq!(panel.slider("Mic").unwrap().value, 70);
        assert_eq!(
            panel.element_ids(),
            vec!["studio", "studio_kradmixer", "studio_kradlink", "Mic_volume_control", "Mic"]
        );
    }

    #[test]
    fn portgroups_before_sysname_render_with_station() {
        let mut panel = Panel::new();
        panel.got_add_portgroup("Early", 10.0, "", 0.0);
        assert!(panel.take_updates().is_empty());

        panel.got_sysname("studio");
        match &panel.take_updates()[..] {
            [ViewUpdate::Mount { html, .. }] => assert!(html.contains("Early_volume_control")),
            other => panic!("unexpected updates {other:?}"),
        }
    }

    #[test]
    fn destroy_removes_station_root() {
        let mut panel = mounted();
        panel.got_add_portgroup("Mic", 80.0, "", 0.0);
        panel.take_updates();
        panel.destroy();
        assert_eq!(
            panel.take_updates(),
            vec![ViewUpdate::Remove { id: "studio".into() }]
        );
    }
}
