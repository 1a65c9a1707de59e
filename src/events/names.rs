use serde::{Deserialize, Serialize};

/// Groups of events the host subscribes to together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EventCategory {
    /// Scoped by mode id.
    Session,
    /// The rest are scoped by data capture view id.
    AdvancedOverlay,
    BasicOverlay,
    ValidationFlow,
}

impl EventCategory {
    pub fn is_mode_scoped(&self) -> bool {
        matches!(self, EventCategory::Session)
    }
}

/// Every event the bridge sends to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelCaptureEvent {
    DidUpdateSession,
    ViewForCapturedLabel,
    AnchorForCapturedLabel,
    OffsetForCapturedLabel,
    ViewForCapturedLabelField,
    AnchorForCapturedLabelField,
    OffsetForCapturedLabelField,
    BrushForLabel,
    BrushForFieldOfLabel,
    DidTapLabel,
    DidCaptureLabelWithFields,
    DidSubmitManualInputForField,
}

impl LabelCaptureEvent {
    pub const ALL: [LabelCaptureEvent; 12] = [
        LabelCaptureEvent::DidUpdateSession,
        LabelCaptureEvent::ViewForCapturedLabel,
        LabelCaptureEvent::AnchorForCapturedLabel,
        LabelCaptureEvent::OffsetForCapturedLabel,
        LabelCaptureEvent::ViewForCapturedLabelField,
        LabelCaptureEvent::AnchorForCapturedLabelField,
        LabelCaptureEvent::OffsetForCapturedLabelField,
        LabelCaptureEvent::BrushForLabel,
        LabelCaptureEvent::BrushForFieldOfLabel,
        LabelCaptureEvent::DidTapLabel,
        LabelCaptureEvent::DidCaptureLabelWithFields,
        LabelCaptureEvent::DidSubmitManualInputForField,
    ];

    /// Wire name the host listens on.
    pub fn name(&self) -> &'static str {
        match self {
            LabelCaptureEvent::DidUpdateSession => "LabelCaptureListener.didUpdateSession",
            LabelCaptureEvent::ViewForCapturedLabel => {
                "LabelCaptureAdvancedOverlayListener.viewForCapturedLabel"
            }
            LabelCaptureEvent::AnchorForCapturedLabel => {
                "LabelCaptureAdvancedOverlayListener.anchorForCapturedLabel"
            }
            LabelCaptureEvent::OffsetForCapturedLabel => {
                "LabelCaptureAdvancedOverlayListener.offsetForCapturedLabel"
            }
            LabelCaptureEvent::ViewForCapturedLabelField => {
                "LabelCaptureAdvancedOverlayListener.viewForCapturedLabelField"
            }
            LabelCaptureEvent::AnchorForCapturedLabelField => {
                "LabelCaptureAdvancedOverlayListener.anchorForCapturedLabelField"
            }
            LabelCaptureEvent::OffsetForCapturedLabelField => {
                "LabelCaptureAdvancedOverlayListener.offsetForCapturedLabelField"
            }
            LabelCaptureEvent::BrushForLabel => "LabelCaptureBasicOverlayListener.brushForLabel",
            LabelCaptureEvent::BrushForFieldOfLabel => {
                "LabelCaptureBasicOverlayListener.brushForFieldOfLabel"
            }
            LabelCaptureEvent::DidTapLabel => "LabelCaptureBasicOverlayListener.didTapLabel",
            LabelCaptureEvent::DidCaptureLabelWithFields => {
                "LabelCaptureValidationFlowListener.didCaptureLabelWithFields"
            }
            LabelCaptureEvent::DidSubmitManualInputForField => {
                "LabelCaptureValidationFlowListener.didSubmitManualInputForField"
            }
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            LabelCaptureEvent::DidUpdateSession => EventCategory::Session,
            LabelCaptureEvent::ViewForCapturedLabel
            | LabelCaptureEvent::AnchorForCapturedLabel
            | LabelCaptureEvent::OffsetForCapturedLabel
            | LabelCaptureEvent::ViewForCapturedLabelField
            | LabelCaptureEvent::AnchorForCapturedLabelField
            | LabelCaptureEvent::OffsetForCapturedLabelField => EventCategory::AdvancedOverlay,
            LabelCaptureEvent::BrushForLabel
            | LabelCaptureEvent::BrushForFieldOfLabel
            | LabelCaptureEvent::DidTapLabel => EventCategory::BasicOverlay,
            LabelCaptureEvent::DidCaptureLabelWithFields
            | LabelCaptureEvent::DidSubmitManualInputForField => EventCategory::ValidationFlow,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn names_are_unique_and_resolvable() {
        let names: HashSet<_> = LabelCaptureEvent::ALL.iter().map(|e| e.name()).collect();
        assert_eq!(names.len(), LabelCaptureEvent::ALL.len());
        for event in LabelCaptureEvent::ALL {
            assert_eq!(LabelCaptureEvent::from_name(event.name()), Some(event));
        }
    }

    #[test]
    fn only_session_events_are_mode_scoped() {
        for event in LabelCaptureEvent::ALL {
            assert_eq!(
                event.category().is_mode_scoped(),
                event == LabelCaptureEvent::DidUpdateSession
            );
        }
    }
}
