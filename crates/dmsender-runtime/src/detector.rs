//! Log-line classifier for backend startup stages.

use dmsender_core::records::WARNING_MARKER;
use dmsender_core::{StageTransition, StartupStage};

/// Custom banner the backend prints once it is fully up.
pub const SUCCESS_BANNER: &str = "弹幕发射场启动成功";

/// Status shown when the success banner is seen.
pub const SUCCESS_BANNER_STATUS: &str = "Backend reported successful startup";

/// Turns free-text backend output into one-shot stage transitions.
///
/// Stages are checked in order and the first unreached stage whose trigger
/// the line contains fires. Reaching a later stage marks any skipped earlier
/// stages as reached without firing them, so fired stages always increase.
#[derive(Debug, Clone, Default)]
pub struct StageDetector {
    reached: [bool; StartupStage::DETECTABLE.len()],
}

impl StageDetector {
    pub const fn new() -> Self {
        Self {
            reached: [false; StartupStage::DETECTABLE.len()],
        }
    }

    /// Classify one line, returning at most one transition.
    pub fn classify(&mut self, line: &str) -> Option<StageTransition> {
        for (slot, stage) in StartupStage::DETECTABLE.iter().enumerate() {
            if self.reached[slot] {
                continue;
            }
            let Some(trigger) = stage.trigger() else {
                continue;
            };
            if line.contains(trigger) {
                for earlier in &mut self.reached[..=slot] {
                    *earlier = true;
                }
                return Some(StageTransition::new(*stage));
            }
        }
        None
    }

    /// Forget every reached stage.
    pub fn reset(&mut self) {
        self.reached = [false; StartupStage::DETECTABLE.len()];
    }

    pub fn all_reached(&self) -> bool {
        self.reached.iter().all(|r| *r)
    }

    /// Highest stage reached so far.
    pub fn current(&self) -> StartupStage {
        StartupStage::DETECTABLE
            .iter()
            .zip(self.reached.iter())
            .filter(|(_, reached)| **reached)
            .map(|(stage, _)| *stage)
            .next_back()
            .unwrap_or(StartupStage::Idle)
    }

    pub fn is_warning(line: &str) -> bool {
        line.contains(WARNING_MARKER)
    }

    pub fn is_success_banner(line: &str) -> bool {
        line.contains(SUCCESS_BANNER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STARTING: &str =
        "2024-05-01 INFO 1234 --- [main] c.d.DanmakuSenderApplication : Starting DanmakuSenderApplication v1.0";
    const TOMCAT: &str = "o.s.b.w.embedded.tomcat.TomcatWebServer : Tomcat started on port(s): 8010 (http)";
    const STARTED: &str = "c.d.DanmakuSenderApplication : Started DanmakuSenderApplication in 3.2 seconds";

    fn fired(detector: &mut StageDetector, lines: &[&str]) -> Vec<StartupStage> {
        lines
            .iter()
            .filter_map(|l| detector.classify(l))
            .map(|t| t.stage)
            .collect()
    }

    #[test]
    fn fires_each_stage_once_in_order() {
        let mut detector = StageDetector::new();
        let stages = fired(&mut detector, &[STARTING, TOMCAT, STARTED]);
        assert_eq!(stages, StartupStage::DETECTABLE.to_vec());
        assert!(detector.all_reached());
        assert_eq!(detector.current(), StartupStage::ApplicationReady);
    }

    #[test]
    fn repeated_trigger_fires_once() {
        let mut detector = StageDetector::new();
        assert!(detector.classify(STARTING).is_some());
        assert!(detector.classify(STARTING).is_none());
        assert!(detector.classify(STARTING).is_none());
        assert!(!detector.all_reached());
    }

    #[test]
    fn starting_line_does_not_fire_started() {
        // "Starting DanmakuSenderApplication" must not satisfy the
        // "Started DanmakuSenderApplication" trigger.
        let mut detector = StageDetector::new();
        let t = detector.classify(STARTING).unwrap();
        assert_eq!(t.stage, StartupStage::SpringContextStarting);
        assert_eq!(detector.current(), StartupStage::SpringContextStarting);
    }

    #[test]
    fn later_stage_marks_skipped_stages() {
        let mut detector = StageDetector::new();
        let t = detector.classify(STARTED).unwrap();
        assert_eq!(t.stage, StartupStage::ApplicationReady);
        assert!(detector.all_reached());

        // Earlier triggers arriving late never fire.
        assert!(detector.classify(STARTING).is_none());
        assert!(detector.classify(TOMCAT).is_none());
    }

    #[test]
    fn out_of_order_fires_monotonically() {
        let mut detector = StageDetector::new();
        let stages = fired(&mut detector, &[TOMCAT, STARTING, STARTED]);
        assert_eq!(
            stages,
            vec![StartupStage::WebServerBound, StartupStage::ApplicationReady]
        );
    }

    #[test]
    fn one_transition_per_line() {
        let mut detector = StageDetector::new();
        let combined = format!("{STARTING} {TOMCAT}");
        let t = detector.classify(&combined).unwrap();
        assert_eq!(t.stage, StartupStage::SpringContextStarting);
        let t = detector.classify(&combined).unwrap();
        assert_eq!(t.stage, StartupStage::WebServerBound);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let mut detector = StageDetector::new();
        assert!(detector.classify("starting danmakusenderapplication").is_none());
        assert!(detector.classify("Tomcat started on port(s): 9090").is_none());
        assert!(detector.classify("").is_none());
    }

    #[test]
    fn reset_allows_stages_to_fire_again() {
        let mut detector = StageDetector::new();
        fired(&mut detector, &[STARTING, TOMCAT, STARTED]);
        detector.reset();
        assert!(!detector.all_reached());
        assert_eq!(detector.current(), StartupStage::Idle);
        assert_eq!(
            detector.classify(STARTING).map(|t| t.stage),
            Some(StartupStage::SpringContextStarting)
        );
    }

    #[test]
    fn warning_and_banner_are_independent_of_stages() {
        assert!(StageDetector::is_warning("2024 WARN something odd"));
        assert!(!StageDetector::is_warning("warning: lowercase"));
        assert!(StageDetector::is_success_banner("=== 弹幕发射场启动成功 ==="));

        let mut detector = StageDetector::new();
        assert!(detector.classify("=== 弹幕发射场启动成功 ===").is_none());
        assert_eq!(detector.current(), StartupStage::Idle);
    }
}
