use sequent_compose_core::{
    ClipData, ClipPayload, Config, DriveCommand, Engine, IdentityResolver, Inputs, TimelineData,
    TrackData, Value,
};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn const_clip(start: f32, end: f32, blend_in: f32, blend_out: f32, v: f32) -> ClipData {
    ClipData {
        start,
        end,
        blend_in,
        blend_out,
        time_scale: 1.0,
        payload: ClipPayload::Constant(Value::Float(v)),
    }
}

fn track(path: &str, reset: bool, clips: Vec<ClipData>) -> TrackData {
    TrackData {
        id: format!("t-{path}"),
        name: path.to_string(),
        target_path: path.to_string(),
        reset_on_exit: reset,
        clips,
    }
}

fn timeline(name: &str, duration: f32, tracks: Vec<TrackData>) -> TimelineData {
    TimelineData {
        id: None,
        name: name.to_string(),
        tracks,
        duration,
    }
}

fn play(instance: sequent_compose_core::InstanceId) -> Inputs {
    Inputs::one(DriveCommand::SetActive {
        instance,
        active: true,
    })
}

/// it should advance time by dt * time_scale and freeze exactly when
/// deactivated
#[test]
fn time_scale_advance_and_freeze() {
    let mut engine = Engine::new(Config::default());
    let tl = engine
        .load_timeline(timeline("empty", 10.0, vec![]))
        .unwrap();
    let inst = engine.instantiate(tl, &mut IdentityResolver).unwrap();

    engine.step(
        0.1,
        Inputs {
            commands: vec![
                DriveCommand::SetTimeScale {
                    instance: inst,
                    time_scale: 2.0,
                },
                DriveCommand::SetActive {
                    instance: inst,
                    active: true,
                },
            ],
        },
    );
    approx(engine.instance_time(inst).unwrap(), 0.2, 1e-6);

    engine.step(0.1, Inputs::none());
    approx(engine.instance_time(inst).unwrap(), 0.4, 1e-6);

    engine.step(
        0.1,
        Inputs::one(DriveCommand::SetActive {
            instance: inst,
            active: false,
        }),
    );
    let frozen = engine.instance_time(inst).unwrap();
    engine.step(0.1, Inputs::none());
    engine.step(0.1, Inputs::none());
    assert_eq!(engine.instance_time(inst).unwrap(), frozen);
    assert_eq!(engine.instance_active(inst), Some(false));
}

/// it should end the step with the clip's exact raw value when exactly one
/// clip contributes, even at partial weight
#[test]
fn single_contributor_identity() {
    let mut engine = Engine::new(Config::default());
    engine.set_property("node/x", Value::Float(0.0));
    let tl = engine
        .load_timeline(timeline(
            "one",
            4.0,
            vec![track("node/x", false, vec![const_clip(0.0, 2.0, 1.0, 0.0, 7.25)])],
        ))
        .unwrap();
    let inst = engine.instantiate(tl, &mut IdentityResolver).unwrap();

    // t = 0.5 inside the blend-in window: weight 0.5, but with a single
    // contributor the weight path degenerates to identity.
    engine.step(0.5, play(inst));
    assert_eq!(engine.property("node/x"), Some(&Value::Float(7.25)));
}

/// it should blend two equally-weighted clips on the same track to the
/// midpoint: windows [0,2] and [1,3], 0.5s ease, playhead in the overlap
#[test]
fn two_clip_overlap_blends_to_midpoint() {
    let mut engine = Engine::new(Config::default());
    engine.set_property("node/x", Value::Float(-1.0));
    let tl = engine
        .load_timeline(timeline(
            "overlap",
            4.0,
            vec![track(
                "node/x",
                false,
                vec![
                    const_clip(0.0, 2.0, 0.5, 0.5, 0.0),
                    const_clip(1.0, 3.0, 0.5, 0.5, 10.0),
                ],
            )],
        ))
        .unwrap();
    let inst = engine.instantiate(tl, &mut IdentityResolver).unwrap();

    // Playhead 1.5: both clips at equal weight, result is lerp(v0, v1, 0.5).
    engine.step(1.5, play(inst));
    match engine.property("node/x") {
        Some(Value::Float(x)) => approx(*x, 5.0, 1e-5),
        other => panic!("expected float, got {other:?}"),
    }
}

/// it should exclude a clip whose weight window has not opened yet: at the
/// second clip's exact start with a blend-in window its weight is zero, so
/// only the first clip's value lands
#[test]
fn zero_weight_clip_is_excluded_not_blended() {
    let mut engine = Engine::new(Config::default());
    engine.set_property("node/x", Value::Float(-1.0));
    let tl = engine
        .load_timeline(timeline(
            "edge",
            4.0,
            vec![track(
                "node/x",
                false,
                vec![
                    const_clip(0.0, 2.0, 0.0, 0.0, 3.0),
                    const_clip(1.0, 3.0, 0.5, 0.5, 10.0),
                ],
            )],
        ))
        .unwrap();
    let inst = engine.instantiate(tl, &mut IdentityResolver).unwrap();

    engine.step(1.0, play(inst));
    assert_eq!(engine.property("node/x"), Some(&Value::Float(3.0)));
}

/// it should capture the pre-activation value on enter and restore it
/// exactly on exit, no matter how many blended writes happened in between
#[test]
fn snapshot_enter_exit_round_trip() {
    let mut engine = Engine::new(Config::default());
    engine.set_property("node/x", Value::Float(42.5));
    let tl = engine
        .load_timeline(timeline(
            "resettable",
            4.0,
            vec![track("node/x", true, vec![const_clip(0.0, 4.0, 0.0, 0.0, 5.0)])],
        ))
        .unwrap();
    let inst = engine.instantiate(tl, &mut IdentityResolver).unwrap();

    let out = engine.step(0.5, play(inst));
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, sequent_compose_core::CoreEvent::SnapshotCaptured { .. })));
    assert_eq!(engine.property("node/x"), Some(&Value::Float(5.0)));

    engine.step(0.5, Inputs::none());
    engine.step(0.5, Inputs::none());
    assert_eq!(engine.property("node/x"), Some(&Value::Float(5.0)));

    let out = engine.step(
        0.5,
        Inputs::one(DriveCommand::SetActive {
            instance: inst,
            active: false,
        }),
    );
    assert!(out
        .events
        .iter()
        .any(|e| matches!(e, sequent_compose_core::CoreEvent::SnapshotRestored { .. })));
    assert_eq!(engine.property("node/x"), Some(&Value::Float(42.5)));
}

/// it should skip a track's contribution when its target disappeared, and
/// leave untouched targets alone
#[test]
fn missing_target_is_a_silent_skip() {
    let mut engine = Engine::new(Config::default());
    engine.set_property("node/x", Value::Float(1.0));
    engine.set_property("node/other", Value::Float(9.0));
    let tl = engine
        .load_timeline(timeline(
            "orphan",
            4.0,
            vec![track("node/x", true, vec![const_clip(0.0, 4.0, 0.0, 0.0, 5.0)])],
        ))
        .unwrap();
    let inst = engine.instantiate(tl, &mut IdentityResolver).unwrap();

    engine.remove_property("node/x");
    let out = engine.step(0.5, play(inst));
    assert!(out.changes.is_empty());
    assert_eq!(engine.property("node/x"), None);
    // Targets absent from the accumulator keep their previous value.
    assert_eq!(engine.property("node/other"), Some(&Value::Float(9.0)));
}

/// it should treat a zero-length blend window as an instantaneous
/// full-weight step, never a division by zero
#[test]
fn degenerate_window_is_instantaneous() {
    let mut engine = Engine::new(Config::default());
    engine.set_property("node/x", Value::Float(0.0));
    let tl = engine
        .load_timeline(timeline(
            "step",
            4.0,
            vec![track("node/x", false, vec![const_clip(1.0, 2.0, 0.0, 0.0, 8.0)])],
        ))
        .unwrap();
    let inst = engine.instantiate(tl, &mut IdentityResolver).unwrap();

    // Land exactly on the clip start.
    engine.step(1.0, play(inst));
    assert_eq!(engine.property("node/x"), Some(&Value::Float(8.0)));
}

/// it should produce the same blend within tolerance when track order is
/// reversed (fold order independence at the engine level)
#[test]
fn track_order_does_not_change_the_blend() {
    let tracks = |reverse: bool| {
        let mut ts = vec![
            track("node/x", false, vec![const_clip(0.0, 4.0, 2.0, 0.0, 1.0)]),
            track("node/x", false, vec![const_clip(0.0, 4.0, 4.0, 0.0, -3.0)]),
            track("node/x", false, vec![const_clip(0.0, 4.0, 0.0, 0.0, 7.5)]),
        ];
        if reverse {
            ts.reverse();
        }
        ts
    };

    let run = |reverse: bool| -> f32 {
        let mut engine = Engine::new(Config::default());
        engine.set_property("node/x", Value::Float(0.0));
        let tl = engine
            .load_timeline(timeline("perm", 4.0, tracks(reverse)))
            .unwrap();
        let inst = engine.instantiate(tl, &mut IdentityResolver).unwrap();
        engine.step(1.0, play(inst));
        match engine.property("node/x") {
            Some(Value::Float(x)) => *x,
            other => panic!("expected float, got {other:?}"),
        }
    };

    let a = run(false);
    let b = run(true);
    approx(a, b, 1e-5 * a.abs().max(1.0));
}

/// it should ramp payloads linearly across the clip span
#[test]
fn ramp_payload_follows_the_playhead() {
    let mut engine = Engine::new(Config::default());
    engine.set_property("node/x", Value::Float(0.0));
    let tl = engine
        .load_timeline(timeline(
            "ramp",
            4.0,
            vec![track(
                "node/x",
                false,
                vec![ClipData {
                    start: 0.0,
                    end: 2.0,
                    blend_in: 0.0,
                    blend_out: 0.0,
                    time_scale: 1.0,
                    payload: ClipPayload::Ramp {
                        from: Value::Float(0.0),
                        to: Value::Float(10.0),
                    },
                }],
            )],
        ))
        .unwrap();
    let inst = engine.instantiate(tl, &mut IdentityResolver).unwrap();

    engine.step(0.5, play(inst));
    match engine.property("node/x") {
        Some(Value::Float(x)) => approx(*x, 2.5, 1e-5),
        other => panic!("expected float, got {other:?}"),
    }
}

/// it should seek the root playhead through drive commands
#[test]
fn seek_moves_the_playhead() {
    let mut engine = Engine::new(Config::default());
    engine.set_property("node/x", Value::Float(0.0));
    let tl = engine
        .load_timeline(timeline(
            "seek",
            4.0,
            vec![track("node/x", false, vec![const_clip(3.0, 4.0, 0.0, 0.0, 6.0)])],
        ))
        .unwrap();
    let inst = engine.instantiate(tl, &mut IdentityResolver).unwrap();

    engine.step(
        0.0,
        Inputs {
            commands: vec![
                DriveCommand::SetActive {
                    instance: inst,
                    active: true,
                },
                DriveCommand::Seek {
                    instance: inst,
                    time: 3.5,
                },
            ],
        },
    );
    approx(engine.instance_time(inst).unwrap(), 3.5, 1e-6);
    assert_eq!(engine.property("node/x"), Some(&Value::Float(6.0)));
}

/// it should reject invalid timeline definitions at load time
#[test]
fn load_rejects_invalid_definitions() {
    let mut engine = Engine::new(Config::default());
    let bad = timeline(
        "bad",
        4.0,
        vec![track("node/x", false, vec![const_clip(2.0, 1.0, 0.0, 0.0, 1.0)])],
    );
    assert!(matches!(
        engine.load_timeline(bad),
        Err(sequent_compose_core::ComposeError::InvalidTimeline { .. })
    ));
}

/// it should save timer and snapshot state and restore it exactly
#[test]
fn save_restore_round_trip() {
    let mut engine = Engine::new(Config::default());
    engine.set_property("node/x", Value::Float(11.0));
    let tl = engine
        .load_timeline(timeline(
            "persisted",
            4.0,
            vec![track("node/x", true, vec![const_clip(0.0, 4.0, 0.0, 0.0, 5.0)])],
        ))
        .unwrap();
    let inst = engine.instantiate(tl, &mut IdentityResolver).unwrap();

    engine.step(1.25, play(inst));
    let saved = engine.save_state();

    // Perturb, then restore.
    engine.step(
        1.0,
        Inputs::one(DriveCommand::Seek {
            instance: inst,
            time: 0.0,
        }),
    );
    engine.restore_state(&saved);
    approx(engine.instance_time(inst).unwrap(), 1.25, 1e-6);
    assert_eq!(engine.instance_active(inst), Some(true));

    // The restored snapshot still applies on exit.
    engine.step(
        0.1,
        Inputs::one(DriveCommand::SetActive {
            instance: inst,
            active: false,
        }),
    );
    assert_eq!(engine.property("node/x"), Some(&Value::Float(11.0)));

    // Round-trips through serde untouched.
    let json = serde_json::to_string(&saved).unwrap();
    let back: sequent_compose_core::SavedState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, saved);
}

/// it should carry a captured snapshot across save and resume into a fresh
/// engine: the resumed instance stays steady-active instead of re-entering,
/// so exit restores the value captured before the original activation
#[test]
fn snapshot_survives_resume_into_fresh_engine() {
    let build = |engine: &mut Engine| {
        engine
            .load_timeline(timeline(
                "persisted",
                8.0,
                vec![track("node/x", true, vec![const_clip(0.0, 8.0, 0.0, 0.0, 5.0)])],
            ))
            .unwrap()
    };

    // Session 1: activate, capture 42.5, run a while, save.
    let mut first = Engine::new(Config::default());
    first.set_property("node/x", Value::Float(42.5));
    let tl = build(&mut first);
    let inst = first.instantiate(tl, &mut IdentityResolver).unwrap();
    first.step(1.0, play(inst));
    assert_eq!(first.property("node/x"), Some(&Value::Float(5.0)));
    let saved = first.save_state();

    // Session 2: rebuild through the same load/instantiate sequence. The
    // store only knows the mid-timeline value now.
    let mut second = Engine::new(Config::default());
    second.set_property("node/x", Value::Float(5.0));
    let tl = build(&mut second);
    let inst = second.instantiate(tl, &mut IdentityResolver).unwrap();
    second.restore_state(&saved);
    assert_eq!(second.instance_active(inst), Some(true));
    approx(second.instance_time(inst).unwrap(), 1.0, 1e-6);

    // The first resumed step must not re-enter, or the snapshot would be
    // recaptured from the mid-timeline store value.
    let out = second.step(0.5, Inputs::none());
    assert!(!out.events.iter().any(|e| matches!(
        e,
        sequent_compose_core::CoreEvent::SnapshotCaptured { .. }
            | sequent_compose_core::CoreEvent::Activated { .. }
    )));

    second.step(
        0.5,
        Inputs::one(DriveCommand::SetActive {
            instance: inst,
            active: false,
        }),
    );
    assert_eq!(second.property("node/x"), Some(&Value::Float(42.5)));
}
