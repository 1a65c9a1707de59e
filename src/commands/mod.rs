//! Host command surface: wire names, argument bag and the dispatcher.

mod args;
mod dispatcher;

pub use args::CommandArgs;
pub use dispatcher::CommandDispatcher;

use std::{fmt, str::FromStr};

use crate::error::BridgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GetDefaults,
    RegisterListenerForEvents,
    UnregisterListenerForEvents,
    FinishDidUpdateSessionCallback,
    SetModeEnabledState,
    UpdateLabelCaptureFeedback,
    UpdateLabelCaptureSettings,
    SetViewForCapturedLabel,
    SetAnchorForCapturedLabel,
    SetOffsetForCapturedLabel,
    SetViewForCapturedLabelField,
    SetAnchorForCapturedLabelField,
    SetOffsetForCapturedLabelField,
    ClearCapturedLabelViews,
    RegisterListenerForAdvancedOverlayEvents,
    UnregisterListenerForAdvancedOverlayEvents,
    UpdateLabelCaptureAdvancedOverlay,
    SetBrushForFieldOfLabel,
    SetBrushForLabel,
    RegisterListenerForBasicOverlayEvents,
    UnregisterListenerForBasicOverlayEvents,
    UpdateLabelCaptureBasicOverlay,
    RegisterListenerForValidationFlowEvents,
    UnregisterListenerForValidationFlowEvents,
    UpdateLabelCaptureValidationFlowOverlay,
}

impl Command {
    pub const ALL: [Command; 25] = [
        Command::GetDefaults,
        Command::RegisterListenerForEvents,
        Command::UnregisterListenerForEvents,
        Command::FinishDidUpdateSessionCallback,
        Command::SetModeEnabledState,
        Command::UpdateLabelCaptureFeedback,
        Command::UpdateLabelCaptureSettings,
        Command::SetViewForCapturedLabel,
        Command::SetAnchorForCapturedLabel,
        Command::SetOffsetForCapturedLabel,
        Command::SetViewForCapturedLabelField,
        Command::SetAnchorForCapturedLabelField,
        Command::SetOffsetForCapturedLabelField,
        Command::ClearCapturedLabelViews,
        Command::RegisterListenerForAdvancedOverlayEvents,
        Command::UnregisterListenerForAdvancedOverlayEvents,
        Command::UpdateLabelCaptureAdvancedOverlay,
        Command::SetBrushForFieldOfLabel,
        Command::SetBrushForLabel,
        Command::RegisterListenerForBasicOverlayEvents,
        Command::UnregisterListenerForBasicOverlayEvents,
        Command::UpdateLabelCaptureBasicOverlay,
        Command::RegisterListenerForValidationFlowEvents,
        Command::UnregisterListenerForValidationFlowEvents,
        Command::UpdateLabelCaptureValidationFlowOverlay,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Command::GetDefaults => "getDefaults",
            Command::RegisterListenerForEvents => "registerListenerForEvents",
            Command::UnregisterListenerForEvents => "unregisterListenerForEvents",
            Command::FinishDidUpdateSessionCallback => "finishDidUpdateSessionCallback",
            Command::SetModeEnabledState => "setModeEnabledState",
            Command::UpdateLabelCaptureFeedback => "updateLabelCaptureFeedback",
            Command::UpdateLabelCaptureSettings => "updateLabelCaptureSettings",
            Command::SetViewForCapturedLabel => "setViewForCapturedLabel",
            Command::SetAnchorForCapturedLabel => "setAnchorForCapturedLabel",
            Command::SetOffsetForCapturedLabel => "setOffsetForCapturedLabel",
            Command::SetViewForCapturedLabelField => "setViewForCapturedLabelField",
            Command::SetAnchorForCapturedLabelField => "setAnchorForCapturedLabelField",
            Command::SetOffsetForCapturedLabelField => "setOffsetForCapturedLabelField",
            Command::ClearCapturedLabelViews => "clearCapturedLabelViews",
            Command::RegisterListenerForAdvancedOverlayEvents => {
                "registerListenerForAdvancedOverlayEvents"
            }
            Command::UnregisterListenerForAdvancedOverlayEvents => {
                "unregisterListenerForAdvancedOverlayEvents"
            }
            Command::UpdateLabelCaptureAdvancedOverlay => "updateLabelCaptureAdvancedOverlay",
            Command::SetBrushForFieldOfLabel => "setBrushForFieldOfLabel",
            Command::SetBrushForLabel => "setBrushForLabel",
            Command::RegisterListenerForBasicOverlayEvents => {
                "registerListenerForBasicOverlayEvents"
            }
            Command::UnregisterListenerForBasicOverlayEvents => {
                "unregisterListenerForBasicOverlayEvents"
            }
            Command::UpdateLabelCaptureBasicOverlay => "updateLabelCaptureBasicOverlay",
            Command::RegisterListenerForValidationFlowEvents => {
                "registerListenerForValidationFlowEvents"
            }
            Command::UnregisterListenerForValidationFlowEvents => {
                "unregisterListenerForValidationFlowEvents"
            }
            Command::UpdateLabelCaptureValidationFlowOverlay => {
                "updateLabelCaptureValidationFlowOverlay"
            }
        }
    }
}

impl FromStr for Command {
    type Err = BridgeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.name() == name)
            .ok_or_else(|| BridgeError::UnknownCommand(name.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_name_parses_back() {
        for command in Command::ALL {
            assert_eq!(command.name().parse::<Command>().unwrap(), command);
        }
        let names: HashSet<_> = Command::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), Command::ALL.len());
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "setViewForLabel".parse::<Command>().unwrap_err();
        assert_eq!(err, BridgeError::UnknownCommand("setViewForLabel".into()));
    }
}
