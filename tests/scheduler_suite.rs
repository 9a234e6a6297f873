use std::ops::ControlFlow;
use std::time::Duration;

use warp_starfield::canvas::RecordingSurface;
use warp_starfield::scheduler::{drive, FrameScheduler, ManualScheduler, PacedScheduler};
use warp_starfield::starfield::Starfield;

#[test]
fn manual_scheduler_yields_exact_tick_count() {
    let mut s = ManualScheduler::new(3).with_dt(0.5);
    let ticks: Vec<_> = std::iter::from_fn(|| s.next_frame()).collect();
    assert_eq!(ticks.len(), 3);
    assert_eq!(ticks.iter().map(|t| t.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert!(ticks.iter().all(|t| t.dt == 0.5));
    assert!(s.next_frame().is_none());
}

#[test]
fn drive_runs_every_tick_then_stops() {
    let mut field = Starfield::with_units(80, 40, 25, fastrand::Rng::with_seed(4));
    let mut surface = RecordingSurface::new(80, 40);
    let mut scheduler = ManualScheduler::new(120);

    let frames = drive(&mut scheduler, |_tick| {
        field.advance_frame(&mut surface);
        Ok(ControlFlow::Continue(()))
    })
    .expect("drive");

    assert_eq!(frames, 120);
    assert!((field.color_cycle() - 1.2).abs() < 1e-9);
}

#[test]
fn drive_stops_on_break() {
    let mut scheduler = ManualScheduler::new(100);
    let mut seen = Vec::new();
    let frames = drive(&mut scheduler, |tick| {
        seen.push(tick.index);
        Ok(if tick.index == 4 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        })
    })
    .expect("drive");
    assert_eq!(frames, 5);
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
}

#[test]
fn drive_propagates_callback_errors() {
    let mut scheduler = ManualScheduler::new(10);
    let err = drive(&mut scheduler, |tick| {
        if tick.index == 2 {
            anyhow::bail!("surface lost");
        }
        Ok(ControlFlow::Continue(()))
    })
    .expect_err("error should surface");
    assert!(err.to_string().contains("surface lost"));
}

#[test]
fn paced_scheduler_first_tick_is_immediate() {
    let mut s = PacedScheduler::new(50);
    assert_eq!(s.budget(), Duration::from_millis(20));
    let first = s.next_frame().expect("tick");
    assert_eq!(first.index, 0);
    assert_eq!(first.dt, 0.0);
    let second = s.next_frame().expect("tick");
    assert_eq!(second.index, 1);
    assert!(second.dt >= 0.019, "paced tick came early: {}", second.dt);
}

#[test]
fn paced_scheduler_floors_fps_at_one() {
    assert_eq!(PacedScheduler::new(0).budget(), Duration::from_secs(1));
}
