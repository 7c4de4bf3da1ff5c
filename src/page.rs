//! The page script: which sections exist, what their timelines do, and what
//! the terminal types.

use crate::fx::{
    Easing, ElementRef, EntranceReveal, Endpoint, LineKind, PinDistance, PinSpec, PropertyName,
    ScrollTimeline, TerminalLine, TimelineSegment,
};

/// Scroll distance the hero stays pinned for (px)
pub const HERO_PIN_DISTANCE: f64 = 1500.0;
/// Hero titles are gone by the middle of the pin
pub const HERO_TITLES_OUT: f64 = 0.5;

/// Element selectors
pub const MONOLITH: &str = "#monolith-wrapper";
pub const HERO_TITLE_1: &str = ".hero-title-1";
pub const HERO_TITLE_2: &str = ".hero-title-2";
pub const HERO_TITLE_3: &str = ".hero-title-3";
pub const HERO_SUBTITLE: &str = ".hero-subtitle";
pub const PIPELINE_STRIP: &str = ".pin-wrap";
pub const PIPELINE_IMAGES: &str = ".horiz-img";
pub const CODE_CARD: &str = ".code-card";
pub const FEATURE_BLOCK: &str = ".feature-block";
pub const PARTICLE_CANVAS: &str = "particle-canvas";
pub const NEURAL_GRID: &str = "neural-grid";
pub const TERMINAL_OUTPUT: &str = "terminal-output";
pub const CARDS_CONTAINER: &str = "cards-container";
pub const TECH_CARD_CLASS: &str = "tech-card";
pub const REVEAL_CLASS: &str = "reveal-active";
pub const LIVE_CHART: &str = "live-chart";
pub const CHART_BAR_CLASS: &str = "chart-bar";

/// Live chart shape
pub const CHART_BARS: usize = 30;
/// Bar animation offsets are drawn from [0, this) seconds
pub const CHART_MAX_DELAY: f64 = 2.0;
pub const CHART_CYCLE: f64 = 3.0;

/// Entrance animations for the developer section
pub const CODE_CARD_OFFSET: f64 = -50.0;
pub const CODE_CARD_DURATION: f64 = 0.8;
pub const FEATURE_BLOCK_OFFSET: f64 = 50.0;
pub const FEATURE_BLOCK_DURATION: f64 = 0.6;
/// Extra delay per feature block, in document order
pub const FEATURE_BLOCK_STAGGER: f64 = 0.1;

/// Scroll-tracked regions of the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Hero,
    Pipeline,
    Neural,
    /// Developer section holding the code card
    Dev,
    /// The nth feature block, which triggers on its own
    FeatureBlock(usize),
    Terminal,
    /// Bottom of the document (footer reveal)
    Footer,
}

impl SectionId {
    pub fn selector(&self) -> &'static str {
        match self {
            SectionId::Hero => ".hero-section",
            SectionId::Pipeline => ".pipeline-section",
            SectionId::Neural => ".neural-section",
            SectionId::Dev => ".dev-section",
            SectionId::FeatureBlock(_) => FEATURE_BLOCK,
            SectionId::Terminal => ".terminal-section",
            SectionId::Footer => "body",
        }
    }

    /// Which match of `selector` the trigger element is (None = first)
    pub fn nth(&self) -> Option<usize> {
        match self {
            SectionId::FeatureBlock(i) => Some(*i),
            _ => None,
        }
    }

    /// Where the trigger starts, as "<element edge> <viewport edge>"
    pub fn trigger_start(&self) -> &'static str {
        match self {
            SectionId::Dev => "top 70%",
            SectionId::FeatureBlock(_) => "top 85%",
            SectionId::Terminal => "top 60%",
            SectionId::Footer => "bottom bottom",
            _ => "top top",
        }
    }
}

/// Monolith flies at the camera while the hero titles scatter
pub fn hero_timeline() -> ScrollTimeline {
    let mut timeline = ScrollTimeline::new().pinned(PinSpec {
        distance: PinDistance::Fixed(HERO_PIN_DISTANCE),
        scrub: Some(0.5),
    });

    let title = |selector: &str, property: PropertyName, to: f64| {
        TimelineSegment::to(selector, property, Endpoint::Absolute(to)).between(0.0, HERO_TITLES_OUT)
    };
    let fade = |selector: &str| {
        [
            title(selector, PropertyName::Opacity, 0.0),
            title(selector, PropertyName::Blur, 20.0),
        ]
    };

    let mut segments = vec![
        TimelineSegment::to(MONOLITH, PropertyName::TranslateZ, Endpoint::Absolute(600.0))
            .eased(Easing::Power1InOut),
        TimelineSegment::to(MONOLITH, PropertyName::RotateY, Endpoint::Offset(120.0))
            .eased(Easing::Power1InOut),
        TimelineSegment::to(MONOLITH, PropertyName::RotateX, Endpoint::Offset(20.0))
            .eased(Easing::Power1InOut),
        title(HERO_TITLE_1, PropertyName::TranslateX, -400.0),
    ];
    segments.extend(fade(HERO_TITLE_1));
    segments.push(title(HERO_TITLE_2, PropertyName::Scale, 2.0));
    segments.extend(fade(HERO_TITLE_2));
    segments.push(title(HERO_TITLE_3, PropertyName::TranslateX, 400.0));
    segments.extend(fade(HERO_TITLE_3));
    segments.push(title(HERO_SUBTITLE, PropertyName::TranslateY, 50.0));
    segments.push(title(HERO_SUBTITLE, PropertyName::Opacity, 0.0));

    timeline.register_segments(segments);
    timeline
}

/// Horizontal card strip panned by vertical scroll, images drifting inside
pub fn pipeline_timeline() -> ScrollTimeline {
    let mut timeline = ScrollTimeline::new()
        .pinned(PinSpec {
            distance: PinDistance::ContentOverflow,
            scrub: Some(1.0),
        })
        .measuring(PIPELINE_STRIP);

    timeline.register_segments(vec![
        TimelineSegment::to(PIPELINE_STRIP, PropertyName::TranslateX, Endpoint::ContentOverflow)
            .eased(Easing::None),
        TimelineSegment::new(PIPELINE_IMAGES, PropertyName::XPercent, -15.0, Endpoint::Absolute(15.0))
            .eased(Easing::None),
    ]);
    timeline
}

/// Code card slides in from the left when the developer section shows up
pub fn code_card_reveal() -> EntranceReveal {
    EntranceReveal::new(ElementRef::new(CODE_CARD), CODE_CARD_OFFSET, CODE_CARD_DURATION, 0.0)
}

/// Feature block `index` slides in from the right, staggered by position
pub fn feature_block_reveal(index: usize) -> EntranceReveal {
    EntranceReveal::new(
        ElementRef::nth(FEATURE_BLOCK, index),
        FEATURE_BLOCK_OFFSET,
        FEATURE_BLOCK_DURATION,
        index as f64 * FEATURE_BLOCK_STAGGER,
    )
}

/// Lines typed into the terminal once it scrolls into view
pub fn terminal_script() -> Vec<TerminalLine> {
    vec![
        TerminalLine::new("root@obelisk:~# ./init_sequence.sh", LineKind::Command),
        TerminalLine::new("Loading core modules...", LineKind::Log),
        TerminalLine::new("> [OK] Quantum Mesh", LineKind::Success),
        TerminalLine::new("> [OK] Database Sharding", LineKind::Success),
        TerminalLine::new("> [OK] Global CDN Nodes", LineKind::Success),
        TerminalLine::new("System ready. Listening on port 443...", LineKind::Log),
        TerminalLine::new("root@obelisk:~# _", LineKind::BlinkingCommand),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::Layout;

    #[test]
    fn test_hero_end_state() {
        let mut hero = hero_timeline();
        assert_eq!(hero.invalidate(Layout::default()), Some(HERO_PIN_DISTANCE));

        let end = hero.sample(1.0);
        let monolith = ElementRef::new(MONOLITH);
        assert_eq!(end.get(&monolith, PropertyName::TranslateZ), Some(600.0));
        assert_eq!(end.get(&monolith, PropertyName::RotateY), Some(120.0));
        assert_eq!(end.get(&ElementRef::new(HERO_TITLE_2), PropertyName::Scale), Some(2.0));
        assert_eq!(end.get(&ElementRef::new(HERO_SUBTITLE), PropertyName::Opacity), Some(0.0));
    }

    #[test]
    fn test_hero_titles_gone_by_half() {
        let mut hero = hero_timeline();
        hero.invalidate(Layout::default());

        let half = hero.sample(HERO_TITLES_OUT);
        let title1 = ElementRef::new(HERO_TITLE_1);
        assert_eq!(half.get(&title1, PropertyName::TranslateX), Some(-400.0));
        assert_eq!(half.get(&title1, PropertyName::Opacity), Some(0.0));
        assert_eq!(half.get(&title1, PropertyName::Blur), Some(20.0));
        assert_eq!(half.get(&ElementRef::new(HERO_TITLE_2), PropertyName::Scale), Some(2.0));
        assert_eq!(half.get(&ElementRef::new(HERO_TITLE_3), PropertyName::TranslateX), Some(400.0));
        assert_eq!(half.get(&ElementRef::new(HERO_SUBTITLE), PropertyName::TranslateY), Some(50.0));
        assert_eq!(half.get(&ElementRef::new(HERO_SUBTITLE), PropertyName::Opacity), Some(0.0));

        // Monolith keeps moving through the whole pin
        let rotate = half.get(&ElementRef::new(MONOLITH), PropertyName::RotateY).unwrap_or_default();
        assert!(rotate > 0.0 && rotate < 120.0);

        let quarter = hero.sample(0.25);
        let opacity = quarter.get(&title1, PropertyName::Opacity).unwrap_or_default();
        assert!(opacity > 0.0 && opacity < 1.0);
    }

    #[test]
    fn test_feature_blocks_stagger() {
        let first = feature_block_reveal(0);
        let third = feature_block_reveal(2);
        assert_eq!(first.target(), &ElementRef::nth(FEATURE_BLOCK, 0));
        assert_eq!(third.target(), &ElementRef::nth(FEATURE_BLOCK, 2));
        assert_eq!(third.state(), (FEATURE_BLOCK_OFFSET, 0.0));
        assert_eq!(code_card_reveal().state(), (CODE_CARD_OFFSET, 0.0));
        assert_eq!(SectionId::FeatureBlock(2).nth(), Some(2));
        assert_eq!(SectionId::FeatureBlock(2).trigger_start(), "top 85%");
        assert_eq!(SectionId::Dev.trigger_start(), "top 70%");
    }

    #[test]
    fn test_hero_start_state_is_rest() {
        let hero = hero_timeline();
        let start = hero.sample(0.0);
        for w in start.iter() {
            assert_eq!(w.value, w.property.rest_value(), "{:?}", w);
        }
    }

    #[test]
    fn test_pipeline_measures_strip() {
        let pipeline = pipeline_timeline();
        assert_eq!(pipeline.content_source(), Some(&ElementRef::new(PIPELINE_STRIP)));
        assert_eq!(pipeline.segments().len(), 2);
    }

    #[test]
    fn test_terminal_script_shape() {
        let script = terminal_script();
        assert_eq!(script.len(), 7);
        assert_eq!(script[6].kind, LineKind::BlinkingCommand);
        assert!(script.iter().all(|l| l.revealed_chars() == 0));
    }
}
