// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BpmnAssist-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of BPMN Assist and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! BPMN 2.0 XML (with DI) import and export.

pub mod export;
pub mod import;

pub use export::export_bpmn;
pub use import::{import_bpmn, BpmnImportError};

pub(crate) const BPMN_MODEL_NS: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";
pub(crate) const BPMN_DI_NS: &str = "http://www.omg.org/spec/BPMN/20100524/DI";
pub(crate) const DC_NS: &str = "http://www.omg.org/spec/DD/20100524/DC";
pub(crate) const DI_NS: &str = "http://www.omg.org/spec/DD/20100524/DI";
/// Namespace for free-form element properties set through `updateElement`.
pub(crate) const ASSIST_NS: &str = "http://bpmn-assist.dev/schema/1.0";

/// The document `clear` resets to: a definitions element wrapping one empty process.
pub const BLANK_DIAGRAM_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" xmlns:bpmndi="http://www.omg.org/spec/BPMN/20100524/DI" xmlns:dc="http://www.omg.org/spec/DD/20100524/DC" xmlns:di="http://www.omg.org/spec/DD/20100524/DI" id="Definitions_1" targetNamespace="http://bpmn.io/schema/bpmn">
  <bpmn:process id="Process_1" isExecutable="false" />
  <bpmndi:BPMNDiagram id="BPMNDiagram_1">
    <bpmndi:BPMNPlane id="BPMNPlane_1" bpmnElement="Process_1" />
  </bpmndi:BPMNDiagram>
</bpmn:definitions>
"#;

#[cfg(test)]
mod tests {
    use super::{export_bpmn, import_bpmn, BLANK_DIAGRAM_XML};
    use crate::model::fixtures::approval_process;
    use crate::model::ElementKind;

    #[test]
    fn blank_diagram_is_just_the_root_process() {
        let diagram = import_bpmn(BLANK_DIAGRAM_XML).expect("import blank");
        assert_eq!(diagram.len(), 1);
        assert_eq!(diagram.root_id().map(|id| id.as_str()), Some("Process_1"));
        assert_eq!(diagram.definitions_id().as_str(), "Definitions_1");
    }

    #[test]
    fn export_then_import_keeps_graph_names_and_bounds() {
        let original = approval_process();
        let xml = export_bpmn(&original);
        let reimported = import_bpmn(&xml).expect("reimport");

        for id in ["Start", "Task_Review", "Gateway_Approved", "End", "Flow_1", "Flow_2", "Flow_3"]
        {
            let before = original.get(id).expect("original element");
            let after = reimported.get(id).expect("reimported element");
            assert_eq!(before.kind(), after.kind(), "{id}");
            assert_eq!(before.name(), after.name(), "{id}");
            assert_eq!(before.bounds(), after.bounds(), "{id}");
            assert_eq!(before.source(), after.source(), "{id}");
            assert_eq!(before.target(), after.target(), "{id}");
        }

        let label = reimported.get("Flow_3_label").expect("flow label");
        assert_eq!(label.kind(), ElementKind::Label);
        assert_eq!(label.label_target().map(|id| id.as_str()), Some("Flow_3"));
    }
}
