// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_api_content(entities: usize) -> String {
    let mut content = String::new();

    for index in 0..entities {
        content.push_str(&format!(
            "/// Entity number {index}\nentity Entity{index} {{\n  field id: Integer\n  mutable field title: String = \"untitled\"\n  field tags: List<String>?\n"
        ));
        if index > 0 {
            content.push_str(&format!("  field previous: Entity{}?\n", index - 1));
        }
        content.push_str(&format!(
            "  field address: * {{ schema {{ field street: String }} }}\n  endpoint show GET /entities{index}/$id {{\n    parameter id: Entity{index}.id\n    success 200: Entity{index}\n  }}\n  endpoint /entities{index} {{\n    get {{ success: List<Entity{index}> }}\n    post {{ request: Entity{index} }}\n  }}\n}}\n\n"
        ));
    }

    content.push_str("scenario smoke {\n  @login(\"admin\")\n  GET /entities0/1\n}\n");
    content
}
