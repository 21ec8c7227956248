use crate::panel::{
    CROSSFADE_CONTROL, LinkView, OpusControls, Orientation, Panel, Portgroup, Slider, VOLUME_CONTROL,
};
use crate::protocol::{LinkControl, OperationMode};
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;

#[derive(Props, Clone, PartialEq)]
pub struct AppProps {
    pub krad_uri: String,
    pub panel: Option<Panel>,
}

#[derive(Props, Clone, PartialEq)]
pub struct StationProps {
    pub panel: Panel,
}

#[derive(Props, Clone, PartialEq)]
pub struct PortgroupProps {
    pub portgroup: Portgroup,
}

#[derive(Props, Clone, PartialEq)]
pub struct LinkProps {
    pub link: LinkView,
}

#[derive(Props, Clone, PartialEq)]
pub struct OpusProps {
    pub link_num: u32,
    pub opus: OpusControls,
}

#[derive(Props, Clone, PartialEq)]
pub struct SliderProps {
    pub slider: Slider,
    pub kind: String,
    pub target: String,
    pub control: String,
}

fn render<P: Clone + 'static>(component: fn(P) -> Element, props: P) -> String {
    let mut dom = VirtualDom::new_with_props(component, props);
    // Build the tree before rendering to avoid SSR panics.
    let mut noop = NoOpMutations {};
    let _ = dom.rebuild(&mut noop);
    dioxus_ssr::render(&dom)
}

pub fn render_html(krad_uri: &str, panel: Option<&Panel>) -> String {
    render(
        App,
        AppProps {
            krad_uri: krad_uri.to_string(),
            panel: panel.cloned(),
        },
    )
}

/// Station markup, or nothing before the station has introduced itself.
pub fn render_station(panel: &Panel) -> String {
    if panel.sysname.is_none() {
        return String::new();
    }
    render(
        Station,
        StationProps {
            panel: panel.clone(),
        },
    )
}

pub fn render_volume_control(portgroup: &Portgroup) -> String {
    render(
        VolumeControl,
        PortgroupProps {
            portgroup: portgroup.clone(),
        },
    )
}

pub fn render_crossfade_control(portgroup: &Portgroup) -> String {
    render(
        CrossfadeControl,
        PortgroupProps {
            portgroup: portgroup.clone(),
        },
    )
}

pub fn render_link(link: &LinkView) -> String {
    render(LinkBlock, LinkProps { link: link.clone() })
}

fn link_control_name(control: LinkControl) -> &'static str {
    match control {
        LinkControl::OpusBitrate => "opus_bitrate",
        LinkControl::OpusComplexity => "opus_complexity",
    }
}

#[component]
fn SliderInput(props: SliderProps) -> Element {
    let slider = &props.slider;
    let orientation = match slider.orientation {
        Orientation::Horizontal => "horizontal",
        Orientation::Vertical => "vertical",
    };
    rsx! {
        input {
            id: "{slider.id}",
            class: "slider {orientation}",
            r#type: "range",
            min: "{slider.min}",
            max: "{slider.max}",
            step: "1",
            value: "{slider.value}",
            "data-kind": "{props.kind}",
            "data-target": "{props.target}",
            "data-control": "{props.control}",
        }
    }
}

#[component]
fn VolumeControl(props: PortgroupProps) -> Element {
    let pg = &props.portgroup;
    let control_id = pg.volume_control_id();
    rsx! {
        div { id: "{control_id}", class: "kradmixer_control volume_control",
            SliderInput {
                slider: pg.volume.clone(),
                kind: "portgroup".to_string(),
                target: pg.name.clone(),
                control: VOLUME_CONTROL.to_string(),
            }
            h2 { "{pg.name}" }
        }
    }
}

#[component]
fn CrossfadeControl(props: PortgroupProps) -> Element {
    let pg = &props.portgroup;
    let Some(crossfade) = pg.crossfade.as_ref() else {
        return rsx! {};
    };
    let control_id = pg.crossfade_control_id();
    rsx! {
        div { id: "{control_id}", class: "kradmixer_control crossfade_control",
            SliderInput {
                slider: crossfade.slider.clone(),
                kind: "portgroup".to_string(),
                target: pg.name.clone(),
                control: CROSSFADE_CONTROL.to_string(),
            }
            h2 { "{crossfade.label}" }
        }
    }
}

#[component]
fn LinkBlock(props: LinkProps) -> Element {
    let view = &props.link;
    let link = &view.link;
    let id = view.id();
    let operation_mode = link.operation_mode.to_string();
    let av_mode = link.av_mode.to_string();
    let video_source = link.video_source.clone().unwrap_or_default();
    let url = link.stream_url();
    let video_codec = link.video_codec.clone().unwrap_or_default();
    let audio_codec = link.audio_codec.clone().unwrap_or_default();
    let capture = link.operation_mode == OperationMode::Capture;
    let transmit = link.operation_mode == OperationMode::Transmit;
    let show_video = transmit && link.av_mode.has_video();
    let show_audio = transmit && link.av_mode.has_audio();

    rsx! {
        div { class: "kradlink_link",
            div { id: "{id}",
                h3 { "{operation_mode}" }
                h4 { "{av_mode}" }
                if capture {
                    h5 { "{video_source}" }
                }
                if transmit {
                    h5 { a { href: "{url}", "{url}" } }
                }
                if show_video {
                    h5 { "{video_codec}" }
                }
                if show_audio {
                    h5 { "{audio_codec}" }
                }
                if let Some(opus) = view.opus.clone() {
                    OpusBlock { link_num: link.link_num, opus }
                }
            }
        }
    }
}

#[component]
fn OpusBlock(props: OpusProps) -> Element {
    let opus = &props.opus;
    let target = props.link_num.to_string();
    let frame_size = opus.frame_size.map(|f| f.to_string()).unwrap_or_default();
    let bitrate_label = opus.bitrate_label.clone();
    let bitrate = opus.bitrate.value;
    let complexity_label = opus.complexity_label.clone();
    let complexity = opus.complexity.value;
    rsx! {
        h5 { "Opus frame size: {frame_size}" }
        h5 {
            "Opus bitrate: "
            span { id: "{bitrate_label}", "{bitrate}" }
        }
        SliderInput {
            slider: opus.bitrate.clone(),
            kind: "link".to_string(),
            target: target.clone(),
            control: link_control_name(LinkControl::OpusBitrate).to_string(),
        }
        h5 {
            "Opus complexity: "
            span { id: "{complexity_label}", "{complexity}" }
        }
        SliderInput {
            slider: opus.complexity.clone(),
            kind: "link".to_string(),
            target,
            control: link_control_name(LinkControl::OpusComplexity).to_string(),
        }
    }
}

#[component]
fn Station(props: StationProps) -> Element {
    let panel = &props.panel;
    let sysname = panel.sysname.clone().unwrap_or_default();
    let mixer_id = panel.mixer_id().unwrap_or_default();
    let link_area_id = panel.link_area_id().unwrap_or_default();
    rsx! {
        div { class: "kradradio_station", id: "{sysname}",
            div { class: "kradradio",
                h2 { "{sysname}" }
            }
            div { class: "kradmixer", id: "{mixer_id}",
                for pg in panel.portgroups.iter() {
                    VolumeControl { portgroup: pg.clone() }
                    if pg.crossfade.is_some() {
                        CrossfadeControl { portgroup: pg.clone() }
                    }
                }
            }
            div { class: "kradlink", id: "{link_area_id}",
                for link in panel.links.iter() {
                    LinkBlock { link: link.clone() }
                }
            }
            div { class: "kradcompositor" }
        }
    }
}

#[component]
fn App(props: AppProps) -> Element {
    let station = props.panel.clone().filter(|p| p.sysname.is_some());
    let styles = r#"
* { box-sizing: border-box; }
body, html { margin: 0; padding: 0; background: #0e1016; }
.page { min-height: 100vh; padding: 28px 18px; color: #e6e9f2; font-family: "Inter", system-ui, -apple-system, sans-serif; }
.header { display: flex; flex-direction: column; gap: 4px; margin-bottom: 16px; }
.title { font-size: 24px; margin: 0; }
.tag { width: fit-content; padding: 6px 10px; border-radius: 999px; background: #151822; border: 1px solid #232838; color: #aeb7cc; font-size: 13px; }
.status { color: #8f98ac; font-size: 13px; min-height: 16px; }
.kradradio_station { background: #141720; border: 1px solid #20263a; border-radius: 14px; padding: 18px; margin-bottom: 16px; }
.kradradio h2 { margin: 0 0 12px 0; font-size: 20px; }
.kradmixer, .kradlink { display: flex; flex-wrap: wrap; gap: 12px; margin-bottom: 14px; }
.kradmixer_control { display: flex; flex-direction: column; align-items: center; gap: 8px; padding: 12px; background: #10131b; border: 1px solid #1f2433; border-radius: 10px; min-width: 96px; }
.kradmixer_control h2 { margin: 0; font-size: 13px; color: #c5cee3; font-weight: 600; }
.crossfade_control { min-width: 240px; }
.kradlink_link { padding: 12px; background: #10131b; border: 1px solid #1f2433; border-radius: 10px; min-width: 220px; }
.kradlink_link h3, .kradlink_link h4, .kradlink_link h5 { margin: 4px 0; }
.kradlink_link a { color: #8fb7ff; }
.slider.horizontal { width: 220px; }
.slider.vertical { writing-mode: vertical-lr; direction: rtl; height: 160px; }
"#;

    let script = r#"
(() => {
  const root = document.getElementById('stations');
  const status = document.getElementById('status');
  let ws;

  function send(msg) {
    if (ws && ws.readyState === WebSocket.OPEN) {
      ws.send(JSON.stringify(msg));
    }
  }

  function bindSliders(scope) {
    scope.querySelectorAll('input.slider').forEach((el) => {
      if (el.dataset.bound) return;
      el.dataset.bound = '1';
      el.addEventListener('input', () => {
        const value = parseInt(el.value, 10);
        if (el.dataset.kind === 'portgroup') {
          send({ action: 'portgroup', portgroup_name: el.dataset.target, control_name: el.dataset.control, value });
        } else {
          send({ action: 'link', link_num: parseInt(el.dataset.target, 10), control_name: el.dataset.control, value });
        }
      });
    });
  }

  function apply(update) {
    switch (update.op) {
      case 'reset':
        root.innerHTML = update.html;
        bindSliders(root);
        break;
      case 'mount': {
        const parent = update.parent ? document.getElementById(update.parent) : root;
        if (!parent) break;
        document.getElementById(update.id)?.remove();
        parent.insertAdjacentHTML('beforeend', update.html);
        bindSliders(parent);
        break;
      }
      case 'set_value': {
        const el = document.getElementById(update.id);
        if (el && document.activeElement !== el) el.value = update.value;
        break;
      }
      case 'set_text': {
        const el = document.getElementById(update.id);
        if (el) el.textContent = update.text;
        break;
      }
      case 'remove':
        document.getElementById(update.id)?.remove();
        break;
    }
  }

  function connect() {
    const proto = location.protocol === 'https:' ? 'wss' : 'ws';
    ws = new WebSocket(`${proto}://${location.host}/ws/panel`);
    ws.onopen = () => { status.textContent = ''; };
    ws.onmessage = (evt) => {
      try {
        apply(JSON.parse(evt.data));
      } catch (err) {
        console.log('bad update', err);
      }
    };
    ws.onclose = () => {
      status.textContent = 'Panel connection lost, retrying...';
      setTimeout(connect, 2000);
    };
  }

  bindSliders(root);
  connect();
})();
"#;

    rsx! {
        div { class: "page",
            meta { name: "viewport", content: "width=device-width, initial-scale=1" }
            div { class: "header",
                h1 { class: "title", "Krad Radio" }
                div { class: "tag", "Mixer at {props.krad_uri}" }
                div { id: "status", class: "status" }
            }
            div { id: "stations",
                if let Some(panel) = station {
                    Station { panel }
                }
            }
        }
        style { "{styles}" }
        script { "{script}" }
    }
}
