//! Node kinds and the allowed-child tables
//!
//! Every [`Node`](super::Node) variant has a fieldless [`NodeKind`] mirror. The kind drives the
//! structural checks in `add_child`, error messages and the pretty printer.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Problem,
    Subproblem,
    Solution,
    Paragraph,
    Blob,
    MultipleChoice,
    MultipleSelect,
    Choice,
    Text,
    ParBreak,
    DisplayMath,
    InlineMath,
    Code,
    InlineCode,
    CodeFile,
    ImageFile,
    TrueFalse,
    InlineResponseBox,
}

use NodeKind::*;

const PROBLEM_CHILDREN: &[NodeKind] = &[
    Paragraph,
    Blob,
    DisplayMath,
    Code,
    CodeFile,
    ImageFile,
    MultipleChoice,
    MultipleSelect,
    TrueFalse,
    Solution,
    Subproblem,
];

// subproblems cannot nest
const SUBPROBLEM_CHILDREN: &[NodeKind] = &[
    Paragraph,
    Blob,
    DisplayMath,
    Code,
    CodeFile,
    ImageFile,
    MultipleChoice,
    MultipleSelect,
    TrueFalse,
    Solution,
];

const BODY_CHILDREN: &[NodeKind] = &[Paragraph, Blob, DisplayMath, Code, CodeFile, ImageFile];

const INLINE_CHILDREN: &[NodeKind] = &[Text, InlineMath, InlineCode, InlineResponseBox, ParBreak];

const CHOICE_CONTAINER_CHILDREN: &[NodeKind] = &[Choice];

impl NodeKind {
    pub const ALL: [NodeKind; 18] = [
        Problem,
        Subproblem,
        Solution,
        Paragraph,
        Blob,
        MultipleChoice,
        MultipleSelect,
        Choice,
        Text,
        ParBreak,
        DisplayMath,
        InlineMath,
        Code,
        InlineCode,
        CodeFile,
        ImageFile,
        TrueFalse,
        InlineResponseBox,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Problem => "Problem",
            Subproblem => "Subproblem",
            Solution => "Solution",
            Paragraph => "Paragraph",
            Blob => "Blob",
            MultipleChoice => "MultipleChoice",
            MultipleSelect => "MultipleSelect",
            Choice => "Choice",
            Text => "Text",
            ParBreak => "ParBreak",
            DisplayMath => "DisplayMath",
            InlineMath => "InlineMath",
            Code => "Code",
            InlineCode => "InlineCode",
            CodeFile => "CodeFile",
            ImageFile => "ImageFile",
            TrueFalse => "TrueFalse",
            InlineResponseBox => "InlineResponseBox",
        }
    }

    /// The kinds this node may contain; empty for leaf kinds
    pub fn allowed_child_types(self) -> &'static [NodeKind] {
        match self {
            Problem => PROBLEM_CHILDREN,
            Subproblem => SUBPROBLEM_CHILDREN,
            Solution | Choice => BODY_CHILDREN,
            Paragraph | Blob => INLINE_CHILDREN,
            MultipleChoice | MultipleSelect => CHOICE_CONTAINER_CHILDREN,
            Text | ParBreak | DisplayMath | InlineMath | Code | InlineCode | CodeFile
            | ImageFile | TrueFalse | InlineResponseBox => &[],
        }
    }

    pub fn allows(self, child: NodeKind) -> bool {
        self.allowed_child_types().contains(&child)
    }

    pub fn is_internal(self) -> bool {
        matches!(
            self,
            Problem
                | Subproblem
                | Solution
                | Paragraph
                | Blob
                | MultipleChoice
                | MultipleSelect
                | Choice
        )
    }

    /// Leaves that may only live inside a Paragraph or Blob
    pub fn is_inline(self) -> bool {
        matches!(self, Text | InlineMath | InlineCode | InlineResponseBox)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
