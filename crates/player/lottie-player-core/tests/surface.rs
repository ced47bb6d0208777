mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{controller, loaded, Call, Recorder, RecordingEngine};
use lottie_player::{
    Background, Button, Notification, PlaybackState, PlayerConfig, PlayerController, PlayerError,
    PointerInput, Renderer, SurfaceCapture, Theme, HostEnvironment,
};
use lottie_player_test_fixtures::{animations, players};

#[test]
fn click_toggles_between_playing_and_stopped() {
    let config = PlayerConfig {
        click: true,
        ..Default::default()
    };
    let (mut c, engine) = loaded(config);
    c.stop();
    assert_eq!(c.state(), PlaybackState::Stopped);
    let h = c.handle().unwrap();
    engine.clear_calls();

    c.handle_pointer(PointerInput::Click);
    assert_eq!(c.state(), PlaybackState::Playing);
    c.handle_pointer(PointerInput::Click);
    assert_eq!(c.state(), PlaybackState::Stopped);
    assert_eq!(engine.calls(), vec![Call::Play(h), Call::Stop(h)]);
}

#[test]
fn click_restarts_when_keeping_last_frame() {
    let config = PlayerConfig {
        click: true,
        keep_last_frame: true,
        ..Default::default()
    };
    let (mut c, engine) = loaded(config);
    let h = c.handle().unwrap();
    let rec = Recorder::attach(&mut c);
    engine.clear_calls();

    c.handle_pointer(PointerInput::Click);

    assert_eq!(engine.calls(), vec![Call::Stop(h), Call::Play(h)]);
    assert_eq!(
        rec.states(),
        vec![PlaybackState::Stopped, PlaybackState::Playing]
    );
}

#[test]
fn hover_plays_on_enter_and_stops_on_leave() {
    let config = PlayerConfig {
        hover: true,
        ..Default::default()
    };
    let (mut c, engine) = loaded(config);
    let h = c.handle().unwrap();
    engine.clear_calls();

    c.handle_pointer(PointerInput::Enter);
    assert_eq!(c.state(), PlaybackState::Playing);
    // Already playing: a second enter changes nothing.
    c.handle_pointer(PointerInput::Enter);
    c.handle_pointer(PointerInput::Leave);
    assert_eq!(c.state(), PlaybackState::Stopped);
    assert_eq!(engine.calls(), vec![Call::Play(h), Call::Stop(h)]);

    // Clicking does nothing unless enabled.
    c.handle_pointer(PointerInput::Click);
    assert_eq!(c.state(), PlaybackState::Stopped);
}

#[test]
fn pointer_is_ignored_without_flags() {
    let (mut c, engine) = loaded(PlayerConfig::default());
    engine.clear_calls();
    for input in [PointerInput::Enter, PointerInput::Click, PointerInput::Leave] {
        c.handle_pointer(input);
    }
    assert!(engine.calls().is_empty());
    assert_eq!(c.state(), PlaybackState::Paused);
}

#[test]
fn background_changes_are_published() {
    let (mut c, _engine) = controller(PlayerConfig::default());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    c.events()
        .on_background_change(move |css| sink.borrow_mut().push(css.to_string()));

    c.set_background("#ABC").unwrap();
    c.set_background("rgb(16, 32, 48)").unwrap();
    assert!(matches!(
        c.set_background("chartreuse"),
        Err(PlayerError::InvalidColor { .. })
    ));
    c.set_background("transparent").unwrap();

    assert_eq!(*seen.borrow(), vec!["#aabbcc", "#102030", "transparent"]);
    assert_eq!(c.background(), &Background::Transparent);
}

#[test]
fn unparseable_initial_background_falls_back_to_transparent() {
    let config = PlayerConfig {
        background: Some("white".into()),
        ..Default::default()
    };
    let mut c = PlayerController::new(RecordingEngine::new(), config).unwrap();
    assert_eq!(c.background(), &Background::Transparent);

    c.load(common::MINIMAL);
    assert_eq!(c.state(), PlaybackState::Paused);
    c.set_background("#000").unwrap();
    assert_eq!(c.background().as_css(), "#000000");
}

#[test]
fn vector_snapshot_downloads_markup() {
    let downloads = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&downloads);
    let engine = RecordingEngine::new();
    engine.log.borrow_mut().capture = Some(SurfaceCapture::Markup(
        r#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#.into(),
    ));
    let mut c = PlayerController::new(engine, PlayerConfig::default())
        .unwrap()
        .with_downloader(move |uri: &str, name: &str| {
            sink.borrow_mut().push((uri.to_string(), name.to_string()))
        });
    c.load(common::MINIMAL);

    let snap = c.snapshot(true).unwrap();

    assert!(snap
        .data_uri
        .starts_with("data:image/svg+xml;charset=utf-8,%3Csvg%20xmlns%3D"));
    assert_eq!(snap.filename, "snapshot.svg");
    assert_eq!(
        *downloads.borrow(),
        vec![(snap.data_uri.clone(), "snapshot.svg".to_string())]
    );

    c.snapshot(false).unwrap();
    assert_eq!(downloads.borrow().len(), 1);
}

#[test]
fn raster_snapshot_passes_data_uri_through() {
    let config = PlayerConfig {
        renderer: Renderer::Canvas,
        ..Default::default()
    };
    let (mut c, engine) = loaded(config);
    engine.log.borrow_mut().capture =
        Some(SurfaceCapture::DataUri("data:image/png;base64,iVBORw0KGgo=".into()));

    let snap = c.snapshot(true).unwrap();
    assert_eq!(snap.data_uri, "data:image/png;base64,iVBORw0KGgo=");
    assert_eq!(snap.filename, "snapshot.png");
}

#[test]
fn snapshot_without_surface_is_none() {
    let (mut c, _engine) = loaded(PlayerConfig::default());
    assert!(c.snapshot(true).is_none());
}

#[test]
fn view_tracks_controller() {
    let config = PlayerConfig {
        controls: true,
        buttons: vec![Button::Play, Button::Frame],
        ..Default::default()
    };
    let (mut c, _engine) = controller(config);
    c.load(animations::json("bouncing-ball").unwrap());
    c.set_seeker(30, false);

    let view = c.view();
    assert!(view.has_instance);
    assert_eq!(view.state, PlaybackState::Paused);
    assert_eq!(view.total_frames, 60);
    assert_eq!(view.progress_percent(), 50.0);
    assert_eq!(view.frame_for_progress(25.0), 15);
    assert!(view.shows(Button::Frame));
    assert!(!view.shows(Button::Snapshot));
    assert_eq!(view.theme, Theme::Light);

    c.set_seeker(view.frame_for_progress(100.0), false);
    assert_eq!(c.seeker(), 60);
}

#[test]
fn theme_follows_host_preference() {
    let c = PlayerController::new(RecordingEngine::new(), PlayerConfig::default())
        .unwrap()
        .with_environment(HostEnvironment {
            prefers_dark: true,
            base_url: None,
        });
    assert_eq!(c.view().theme, Theme::Dark);
}

#[test]
fn fixture_configs_drive_the_controller() {
    let config = PlayerConfig::from_json(&players::json("hover-keep-last-frame").unwrap()).unwrap();
    let (mut c, engine) = controller(config);
    c.load(animations::json("offset-range").unwrap());
    assert_eq!(c.total_frames(), 24);
    assert_eq!(c.background().as_css(), "#1e1e1e");
    let h = c.handle().unwrap();
    engine.clear_calls();

    c.handle_pointer(PointerInput::Enter);
    assert_eq!(engine.calls(), vec![Call::Stop(h), Call::Play(h)]);

    let config = PlayerConfig::from_json(&players::json("autoplay-loop").unwrap()).unwrap();
    let (mut c, _engine) = controller(config);
    let rec = Recorder::attach(&mut c);
    c.load(animations::json("bouncing-ball").unwrap());
    assert_eq!(c.state(), PlaybackState::Playing);
    assert!(c.is_looping());
    assert_eq!(c.view().theme, Theme::Dark);
    assert!(rec
        .seen
        .borrow()
        .iter()
        .any(|n| matches!(n, Notification::InstanceSaved(i) if i.renderer == Renderer::Canvas)));
}
