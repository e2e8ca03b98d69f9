// Demonstration workflow: a Gemini image generation node feeding a
// SaveImage node. Needs an API key on the server side.

use crate::workflow::{NodeRef, NodeSpec, WorkflowGraph};

pub const DEFAULT_PROMPT: &str = "A beautiful sunset over mountains";

pub fn demo_workflow(prompt: &str) -> WorkflowGraph {
    let generate = NodeSpec::new("GeminiImage2Node")
        .input("prompt", prompt)
        .input("model", "gemini-pro-latest")
        .input("seed", 12345i64)
        .input("aspect_ratio", "16:9")
        .input("resolution", "2K")
        .input("response_modalities", "IMAGE+TEXT")
        .title("Nano Banana Pro (Google Gemini Image)");
    let save = NodeSpec::new("SaveImage")
        .input("filename_prefix", "ComfyUI")
        .input("images", NodeRef::new("1", 0))
        .title("Save Image");

    WorkflowGraph::new().with_node("1", generate).with_node("2", save)
}
