use serde_json::{json, Map, Value};

/// Primitive parameter types understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Object,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Object => "object",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Object => value.is_object(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
}

/// Loosely-typed parameter schema of a tool: every field is required, primitive types only.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            params: Vec::new(),
        }
    }

    pub fn required(mut self, name: &str, kind: ParamKind) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            kind,
        });
        self
    }

    /// Checks `arguments` against the schema. Returns every problem found, joined.
    /// Unknown extra fields are tolerated.
    pub fn check(&self, arguments: &Value) -> Result<(), String> {
        let Some(object) = arguments.as_object() else {
            return Err("arguments must be a JSON object".to_string());
        };

        let mut problems = Vec::new();
        for param in &self.params {
            match object.get(&param.name) {
                None | Some(Value::Null) => {
                    problems.push(format!("missing required field '{}'", param.name));
                }
                Some(value) if !param.kind.accepts(value) => problems.push(format!(
                    "field '{}' must be a {}",
                    param.name,
                    param.kind.as_str()
                )),
                Some(_) => {}
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }

    /// Renders the schema in the reasoning service's tool format.
    pub fn to_tool_definition(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            properties.insert(param.name.clone(), json!({ "type": param.kind.as_str() }));
        }
        let required: Vec<&str> = self.params.iter().map(|p| p.name.as_str()).collect();

        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}
