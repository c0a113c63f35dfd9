// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the stream session lifecycle

use camera_pipeline::backends::camera::{
    FacingMode, FocusMode, MediaStream, PlatformError, PlatformErrorKind, SessionPhase,
    StreamSession, VideoSink,
};
use camera_pipeline::backends::camera::types::Dimensions;
use camera_pipeline::backends::virtual_camera::{
    FramePattern, VirtualCameraSpec, VirtualDevices, VirtualVideoSink,
};
use camera_pipeline::errors::{AcquisitionError, BestEffort, SessionError, SkipReason};
use std::sync::Arc;
use std::time::Duration;

fn gradient_sink() -> Arc<VirtualVideoSink> {
    Arc::new(VirtualVideoSink::new(FramePattern::Gradient {
        size: Dimensions::new(64, 36),
    }))
}

fn manual_sink() -> Arc<VirtualVideoSink> {
    Arc::new(
        VirtualVideoSink::new(FramePattern::Gradient {
            size: Dimensions::new(64, 36),
        })
        .with_manual_readiness(),
    )
}

fn session_with(
    devices: VirtualDevices,
    sink: Arc<VirtualVideoSink>,
) -> (StreamSession, Arc<VirtualDevices>) {
    let devices = Arc::new(devices);
    (StreamSession::new(devices.clone(), sink), devices)
}

#[tokio::test]
async fn test_start_and_stop() {
    let sink = gradient_sink();
    let (session, devices) = session_with(VirtualDevices::new(), sink.clone());

    session.start(FacingMode::Environment).await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Ready);
    assert_eq!(
        session.active_track().map(|t| t.label()),
        Some("Virtual Back Camera".to_string())
    );
    assert!(sink.is_attached());

    assert_eq!(session.stop(), BestEffort::Applied);
    assert_eq!(session.phase(), SessionPhase::Stopped);
    assert!(session.active_track().is_none());
    assert!(!sink.is_attached());
    assert!(sink.intrinsic_size().is_none());

    let streams = devices.granted_streams();
    let track = &streams[0].virtual_tracks()[0];
    assert!(track.is_stopped());
}

#[tokio::test]
async fn test_request_is_ideal_only() {
    let (session, devices) = session_with(VirtualDevices::new(), gradient_sink());
    session.start(FacingMode::User).await.unwrap();

    let requests = devices.requests();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].has_exact_video());
    assert!(!requests[0].audio);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let (session, _) = session_with(VirtualDevices::new(), gradient_sink());

    // before any start
    assert_eq!(session.stop(), BestEffort::Skipped(SkipReason::AlreadyStopped));
    assert_eq!(session.phase(), SessionPhase::Idle);

    session.start(FacingMode::Environment).await.unwrap();
    assert!(session.stop().is_applied());
    assert_eq!(session.stop(), BestEffort::Skipped(SkipReason::AlreadyStopped));
    assert_eq!(session.phase(), SessionPhase::Stopped);
}

#[tokio::test]
async fn test_start_while_ready_is_noop() {
    let (session, devices) = session_with(VirtualDevices::new(), gradient_sink());
    session.start(FacingMode::Environment).await.unwrap();
    session.start(FacingMode::User).await.unwrap();

    assert_eq!(devices.requests().len(), 1);
    assert_eq!(devices.granted_streams().len(), 1);
}

#[tokio::test]
async fn test_restart_after_stop() {
    let (session, devices) = session_with(VirtualDevices::new(), gradient_sink());
    session.start(FacingMode::Environment).await.unwrap();
    session.stop();
    session.start(FacingMode::User).await.unwrap();

    assert!(session.is_ready());
    assert_eq!(devices.granted_streams().len(), 2);
    assert_eq!(
        session.active_track().map(|t| t.label()),
        Some("Virtual Front Camera".to_string())
    );
}

#[tokio::test]
async fn test_acquisition_errors_are_classified() {
    let cases = [
        ("NotAllowedError", "permission"),
        ("SecurityError", "permission"),
        ("NotFoundError", "device"),
        ("OverconstrainedError", "device"),
        ("NotReadableError", "other"),
        ("SomethingElse", "other"),
    ];

    for (name, expected) in cases {
        let (session, devices) = session_with(VirtualDevices::new(), gradient_sink());
        devices.fail_with(PlatformError::from_name(name, "refused"));

        let err = session.start(FacingMode::Environment).await.unwrap_err();
        let class = match err {
            SessionError::Acquisition(AcquisitionError::PermissionDenied(_)) => "permission",
            SessionError::Acquisition(AcquisitionError::NoDevice(_)) => "device",
            SessionError::Acquisition(AcquisitionError::Other(_)) => "other",
            other => panic!("unexpected error {:?}", other),
        };
        assert_eq!(class, expected, "{} misclassified", name);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.active_track().is_none());
    }
}

#[tokio::test]
async fn test_no_cameras_is_no_device() {
    let (session, _) = session_with(VirtualDevices::with_cameras(Vec::new()), gradient_sink());
    let err = session.start(FacingMode::Environment).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Acquisition(AcquisitionError::NoDevice(_))
    ));
}

#[tokio::test]
async fn test_stream_without_video_track() {
    let mut camera = VirtualCameraSpec::back();
    camera.track_count = 0;
    let sink = gradient_sink();
    let (session, _) = session_with(VirtualDevices::with_cameras(vec![camera]), sink.clone());

    let err = session.start(FacingMode::Environment).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Acquisition(AcquisitionError::NoDevice(_))
    ));
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(!sink.is_attached());
}

#[tokio::test]
async fn test_start_waits_for_readiness() {
    let sink = manual_sink();
    let (session, _) = session_with(VirtualDevices::new(), sink.clone());

    let starter = session.clone();
    let (result, phase_while_waiting) = tokio::join!(starter.start(FacingMode::Environment), async {
        while !sink.is_attached() {
            tokio::task::yield_now().await;
        }
        let phase = session.phase();
        sink.mark_ready();
        phase
    });

    result.unwrap();
    assert_eq!(phase_while_waiting, SessionPhase::Acquiring);
    assert!(session.is_ready());
}

#[tokio::test(start_paused = true)]
async fn test_readiness_timeout() {
    let sink = manual_sink();
    let devices = Arc::new(VirtualDevices::new());
    let session = StreamSession::new(devices.clone(), sink.clone())
        .with_readiness_timeout(Duration::from_secs(2));

    let err = session.start(FacingMode::Environment).await.unwrap_err();
    assert_eq!(err, SessionError::ReadinessTimeout(Duration::from_secs(2)));
    assert_eq!(session.phase(), SessionPhase::Idle);
    assert!(!sink.is_attached());
    assert!(devices.granted_streams()[0].virtual_tracks()[0].is_stopped());
}

#[tokio::test]
async fn test_stop_cancels_readiness_wait() {
    let sink = manual_sink();
    let (session, devices) = session_with(VirtualDevices::new(), sink.clone());

    let starter = session.clone();
    let (result, stopped) = tokio::join!(starter.start(FacingMode::Environment), async {
        while !sink.is_attached() {
            tokio::task::yield_now().await;
        }
        session.stop()
    });

    assert_eq!(result, Err(SessionError::Cancelled));
    assert!(stopped.is_applied());
    assert_eq!(session.phase(), SessionPhase::Stopped);
    assert!(!sink.is_attached());
    assert!(devices.granted_streams()[0].virtual_tracks()[0].is_stopped());

    // a late readiness signal changes nothing
    sink.mark_ready();
    assert!(session.active_track().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_restart_while_cancelled_start_is_pending() {
    let sink = manual_sink();
    let devices = Arc::new(VirtualDevices::new());
    let session = StreamSession::new(devices.clone(), sink.clone())
        .with_readiness_timeout(Duration::from_secs(2));

    let first_attempt = session.clone();
    let (first, second) = tokio::join!(first_attempt.start(FacingMode::Environment), async {
        while !sink.is_attached() {
            tokio::task::yield_now().await;
        }
        session.stop();

        // restart before the cancelled attempt has woken up
        let (second, ()) = tokio::join!(session.start(FacingMode::Environment), async {
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
            sink.mark_ready();
        });
        second
    });

    assert_eq!(first, Err(SessionError::Cancelled));
    assert_eq!(second, Ok(()));
    assert!(session.is_ready());
    assert_eq!(sink.intrinsic_size(), Some(Dimensions::new(64, 36)));

    let granted = devices.granted_streams();
    assert_eq!(granted.len(), 2);
    assert_eq!(sink.attached_stream_id().as_deref(), Some(granted[1].id()));
    assert!(granted[0].virtual_tracks()[0].is_stopped());
    assert!(!granted[1].virtual_tracks()[0].is_stopped());
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_acquisition_releases_late_grant() {
    let devices = VirtualDevices::new().with_grant_delay(Duration::from_secs(5));
    let (session, devices) = session_with(devices, gradient_sink());

    let starter = session.clone();
    let (result, _) = tokio::join!(starter.start(FacingMode::Environment), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        session.stop()
    });

    assert_eq!(result, Err(SessionError::Cancelled));
    assert_eq!(session.phase(), SessionPhase::Stopped);
    let granted = devices.granted_streams();
    assert_eq!(granted.len(), 1);
    assert!(granted[0].virtual_tracks()[0].is_stopped());
}

#[tokio::test]
async fn test_stop_swallows_track_failures() {
    let mut camera = VirtualCameraSpec::back();
    camera.track_count = 2;
    let (session, devices) = session_with(VirtualDevices::with_cameras(vec![camera]), gradient_sink());
    session.start(FacingMode::Environment).await.unwrap();

    let stream = devices.granted_streams()[0].clone();
    let tracks = stream.virtual_tracks();
    tracks[0].fail_stop_with(PlatformError::new(PlatformErrorKind::Unknown, "stuck"));

    assert!(matches!(session.stop(), BestEffort::Ignored(msg) if msg.contains("stuck")));
    assert_eq!(session.phase(), SessionPhase::Stopped);
    assert_eq!(tracks[0].stop_calls(), 1);
    assert!(tracks[1].is_stopped());
}

#[tokio::test]
async fn test_exposure_control() {
    let (session, devices) = session_with(VirtualDevices::new(), gradient_sink());
    assert_eq!(
        session.set_exposure(1.0).await,
        BestEffort::Skipped(SkipReason::NotReady)
    );

    session.start(FacingMode::Environment).await.unwrap();
    let track = devices.granted_streams()[0].virtual_tracks()[0].clone();

    // clamped into the reported [-2, 2]
    assert_eq!(session.set_exposure(5.0).await, BestEffort::Applied);
    assert_eq!(track.applied_constraints()[0].exposure_compensation, Some(2.0));

    // already in effect: no device round-trip
    assert_eq!(
        session.set_exposure(3.0).await,
        BestEffort::Skipped(SkipReason::Unchanged)
    );
    assert_eq!(track.applied_constraints().len(), 1);

    assert!(matches!(session.set_exposure(f64::NAN).await, BestEffort::Ignored(_)));

    track.fail_apply_with(PlatformError::new(PlatformErrorKind::Unknown, "busy"));
    assert!(matches!(session.set_exposure(-1.0).await, BestEffort::Ignored(_)));
    assert!(session.is_ready());
}

#[tokio::test]
async fn test_controls_unsupported_on_front_camera() {
    let (session, _) = session_with(VirtualDevices::new(), gradient_sink());
    session.start(FacingMode::User).await.unwrap();

    assert_eq!(
        session.set_exposure(1.0).await,
        BestEffort::Skipped(SkipReason::Unsupported)
    );
    assert_eq!(
        session.set_focus(0.5).await,
        BestEffort::Skipped(SkipReason::Unsupported)
    );
}

#[tokio::test]
async fn test_focus_maps_onto_range() {
    let (session, devices) = session_with(VirtualDevices::new(), gradient_sink());
    session.start(FacingMode::Environment).await.unwrap();
    let track = devices.granted_streams()[0].virtual_tracks()[0].clone();

    assert_eq!(session.set_focus(0.5).await, BestEffort::Applied);
    assert_eq!(session.set_focus(7.0).await, BestEffort::Applied);

    let applied = track.applied_constraints();
    assert_eq!(applied[0].focus_mode, Some(FocusMode::Manual));
    assert!((applied[0].focus_distance.unwrap() - 5.05).abs() < 1e-9);
    assert!((applied[1].focus_distance.unwrap() - 10.0).abs() < 1e-9);
}
