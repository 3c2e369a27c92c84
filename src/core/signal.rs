use crate::core::{CycleReport, SignalDisplay, SignalPhase};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalTimings {
    pub red_hold: Duration,
    pub yellow_hold: Duration,
}

impl Default for SignalTimings {
    fn default() -> Self {
        Self {
            red_hold: Duration::from_secs(1),
            yellow_hold: Duration::from_secs(2),
        }
    }
}

/// Drives the simulated light for one processed image:
/// red hold, yellow hold, green for the computed time, then off.
pub struct SignalController<D: SignalDisplay> {
    display: D,
    timings: SignalTimings,
}

impl<D: SignalDisplay> SignalController<D> {
    pub fn new(display: D, timings: SignalTimings) -> Self {
        Self { display, timings }
    }

    /// Red while an image is being processed.
    pub fn mark_processing(&self) {
        self.display.show_phase(SignalPhase::Red);
    }

    pub fn mark_failed(&self) {
        self.display.show_phase(SignalPhase::Off);
        self.display.clear();
    }

    pub async fn run_cycle(&self, report: &CycleReport) {
        self.display.show_phase(SignalPhase::Red);
        tokio::time::sleep(self.timings.red_hold).await;

        self.display.show_phase(SignalPhase::Yellow);
        tokio::time::sleep(self.timings.yellow_hold).await;

        self.display.show_phase(SignalPhase::Green);
        self.display.show_result(report);
        tokio::time::sleep(report.green_time.as_duration()).await;

        self.display.show_phase(SignalPhase::Off);
        self.display.clear();
    }
}

/// Text rendering of the three-lamp light.
#[derive(Debug, Default)]
pub struct TerminalDisplay {
    last_phase: Mutex<Option<SignalPhase>>,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(phase: SignalPhase) -> String {
        let lamp = |on: bool, symbol: &'static str| if on { symbol } else { "⚫" };
        format!(
            "[{} {} {}] {:?}",
            lamp(phase == SignalPhase::Red, "🔴"),
            lamp(phase == SignalPhase::Yellow, "🟡"),
            lamp(phase == SignalPhase::Green, "🟢"),
            phase
        )
    }
}

impl SignalDisplay for TerminalDisplay {
    fn show_phase(&self, phase: SignalPhase) {
        if let Ok(mut last) = self.last_phase.lock() {
            if *last == Some(phase) {
                return;
            }
            *last = Some(phase);
        }
        tracing::debug!("Signal phase -> {:?}", phase);
        println!("{}", Self::render(phase));
    }

    fn show_result(&self, report: &CycleReport) {
        println!("{}", report.summary());
    }

    fn clear(&self) {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::GreenTimeSeconds;
    use chrono::Local;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tokio::time::Instant;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Phase(SignalPhase),
        Result(u32),
        Clear,
    }

    #[derive(Clone, Default)]
    struct RecordingDisplay {
        events: Arc<Mutex<Vec<(Event, Duration)>>>,
        start: Arc<Mutex<Option<Instant>>>,
    }

    impl RecordingDisplay {
        fn record(&self, event: Event) {
            let mut start = self.start.lock().unwrap();
            let start = *start.get_or_insert_with(Instant::now);
            self.events.lock().unwrap().push((event, start.elapsed()));
        }

        fn events(&self) -> Vec<(Event, Duration)> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SignalDisplay for RecordingDisplay {
        fn show_phase(&self, phase: SignalPhase) {
            self.record(Event::Phase(phase));
        }

        fn show_result(&self, report: &CycleReport) {
            self.record(Event::Result(report.green_time.as_secs()));
        }

        fn clear(&self) {
            self.record(Event::Clear);
        }
    }

    fn report(green: u32) -> CycleReport {
        CycleReport {
            source: "cam.jpg".to_string(),
            vehicle_count: green - 20,
            breakdown: BTreeMap::new(),
            green_time: GreenTimeSeconds(green),
            annotated_image: None,
            count_file: None,
            processed_at: Local::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_sequence_and_timing() {
        let display = RecordingDisplay::default();
        let controller = SignalController::new(display.clone(), SignalTimings::default());

        controller.run_cycle(&report(27)).await;

        let events = display.events();
        let secs = |d: Duration| d.as_secs();
        assert_eq!(
            events
                .iter()
                .map(|(e, d)| (e.clone(), secs(*d)))
                .collect::<Vec<_>>(),
            vec![
                (Event::Phase(SignalPhase::Red), 0),
                (Event::Phase(SignalPhase::Yellow), 1),
                (Event::Phase(SignalPhase::Green), 3),
                (Event::Result(27), 3),
                (Event::Phase(SignalPhase::Off), 30),
                (Event::Clear, 30),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_timings() {
        let display = RecordingDisplay::default();
        let timings = SignalTimings {
            red_hold: Duration::from_millis(500),
            yellow_hold: Duration::from_millis(500),
        };
        let controller = SignalController::new(display.clone(), timings);

        controller.run_cycle(&report(20)).await;

        let (last, at) = display.events().last().cloned().unwrap();
        assert_eq!(last, Event::Clear);
        assert_eq!(at, Duration::from_secs(21));
    }

    #[test]
    fn test_failure_turns_light_off() {
        let display = RecordingDisplay::default();
        let controller = SignalController::new(display.clone(), SignalTimings::default());

        controller.mark_processing();
        controller.mark_failed();

        let events: Vec<Event> = display.events().into_iter().map(|(e, _)| e).collect();
        assert_eq!(
            events,
            vec![
                Event::Phase(SignalPhase::Red),
                Event::Phase(SignalPhase::Off),
                Event::Clear
            ]
        );
    }

    #[test]
    fn test_terminal_render() {
        assert_eq!(TerminalDisplay::render(SignalPhase::Green), "[⚫ ⚫ 🟢] Green");
        assert_eq!(TerminalDisplay::render(SignalPhase::Off), "[⚫ ⚫ ⚫] Off");
    }
}
