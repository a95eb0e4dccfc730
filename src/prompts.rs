// Copyright 2025 Toolbridge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Prompt optimization templates.

/// Full structured rewrite with role, skills, rules, and workflow sections.
pub const COMPREHENSIVE_TEMPLATE: &str = "\
You are a prompt engineering expert with over 10 years of experience. Your \
task is to optimize the provided prompt following a professional and \
comprehensive structure.

# Role: [Role Name]

## Profile
- **language**: [Primary language of the assistant]
- **description**: [Detailed description of the role and responsibilities]
- **background**: [Relevant history and experience]
- **expertise**: [Areas of specialization]
- **target_audience**: [Intended audience and their expected knowledge level]

## Skills
1. **[Primary Category]**
   - **[Specific Skill]**: [When and how to apply it]
2. **[Secondary Category]**
   - **[Specific Skill]**: [When and how to apply it]

## Rules
- State constraints the assistant must always honor
- State behaviors the assistant must avoid

## Workflow
1. Understand the request
2. Plan the response
3. Produce the output in the requested format

Optimize the following prompt using this structure:";

/// Lightweight checklist-style rewrite.
pub const SIMPLE_TEMPLATE: &str = "\
You are an expert at writing effective prompts. Optimize the provided prompt \
following these guidelines:

## Basic Structure
- **Role**: Clearly define the assistant's role
- **Context**: Provide relevant context
- **Task**: State the task precisely
- **Constraints**: Define important limitations
- **Output Format**: Specify the expected format

## Optimization Principles
1. Be specific and clear
2. Provide examples where helpful
3. Define important constraints
4. Specify the output format
5. Consider edge cases

Optimize the following prompt:";

/// Rewrite oriented toward technical problem statements.
pub const TECHNICAL_TEMPLATE: &str = "\
As a senior prompt engineer specializing in [technical domain], optimize \
this technical prompt:

## Technical Requirements
- **Accuracy**: Ensure technical correctness
- **Completeness**: Cover every relevant aspect
- **Clarity**: Use appropriate technical terminology
- **Structure**: Organize the information logically

## Essential Elements
1. **Problem Definition**: A clear statement of the problem
2. **Technical Context**: Relevant technical background
3. **Constraints**: Important technical limitations
4. **Expected Solution**: What a good solution looks like

Optimize with these technical aspects in mind:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    Comprehensive,
    Simple,
    Technical,
}

impl PromptStyle {
    /// Unknown style names fall back to the comprehensive template.
    pub fn parse(style: &str) -> Self {
        match style {
            "simple" => PromptStyle::Simple,
            "technical" => PromptStyle::Technical,
            _ => PromptStyle::Comprehensive,
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            PromptStyle::Comprehensive => COMPREHENSIVE_TEMPLATE,
            PromptStyle::Simple => SIMPLE_TEMPLATE,
            PromptStyle::Technical => TECHNICAL_TEMPLATE,
        }
    }
}

/// Attach the style's template above the user content.
pub fn render(style: PromptStyle, content: &str) -> String {
    format!("{}\n\n{}", style.template(), content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_parsing() {
        assert_eq!(PromptStyle::parse("simple"), PromptStyle::Simple);
        assert_eq!(PromptStyle::parse("technical"), PromptStyle::Technical);
        assert_eq!(
            PromptStyle::parse("comprehensive"),
            PromptStyle::Comprehensive
        );
        // Unknown styles never fail.
        assert_eq!(PromptStyle::parse("bogus"), PromptStyle::Comprehensive);
    }

    #[test]
    fn test_render_appends_content() {
        let rendered = render(PromptStyle::Simple, "write a haiku");
        assert!(rendered.starts_with(SIMPLE_TEMPLATE));
        assert!(rendered.ends_with("write a haiku"));
    }
}
