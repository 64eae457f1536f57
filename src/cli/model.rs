use std::io::{self, Write};

use serde_json::Value;

/// The telemetry fields shown for each message, already rendered for display.
#[derive(Debug, PartialEq)]
pub struct CncReading {
    pub program_name: String,
    pub spindle_speed: String,
    pub spindle_temp: String,
    pub active_tool: String,
    pub z_axis_power: String,
    pub timestamp_s: String,
}

impl CncReading {
    pub fn parse(json: &Value) -> Self {
        Self {
            program_name: field(json, "programName", "Unknown"),
            spindle_speed: field(json, "spindleActualSpeed", "0"),
            spindle_temp: field(json, "spindleTemp", "0"),
            active_tool: field(json, "activeToolID", "Unknown"),
            z_axis_power: field(json, "axisZDrivePower", "0"),
            timestamp_s: field(json, "timestamp_s", "0"),
        }
    }

    pub fn write_block<W: Write>(&self, out: &mut W, index: u64) -> io::Result<()> {
        writeln!(out, "Message {}:", index)?;
        writeln!(out, "  Program: {}", self.program_name)?;
        writeln!(out, "  Spindle Speed: {} RPM", self.spindle_speed)?;
        writeln!(out, "  Spindle Temp: {}°C", self.spindle_temp)?;
        writeln!(out, "  Active Tool: {}", self.active_tool)?;
        writeln!(out, "  Z-Axis Power: {}", self.z_axis_power)?;
        writeln!(out, "  Timestamp: {}s", self.timestamp_s)?;
        writeln!(out, "{}", "-".repeat(50))
    }
}

// A present null renders the default rather than a literal "None"/"null".
fn field(json: &Value, key: &str, default: &str) -> String {
    match &json[key] {
        Value::Null => default.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn extracts_all_fields() {
        let reading = CncReading::parse(&json!({
            "programName": "O1001",
            "spindleActualSpeed": 12000,
            "spindleTemp": 41.5,
            "activeToolID": "T07",
            "axisZDrivePower": 3.25,
            "timestamp_s": 1718000000,
            "feedRate": 900
        }));
        assert_eq!(reading.program_name, "O1001");
        assert_eq!(reading.spindle_speed, "12000");
        assert_eq!(reading.spindle_temp, "41.5");
        assert_eq!(reading.active_tool, "T07");
        assert_eq!(reading.z_axis_power, "3.25");
        assert_eq!(reading.timestamp_s, "1718000000");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let reading = CncReading::parse(&json!({ "spindleTemp": null }));
        assert_eq!(
            reading,
            CncReading {
                program_name: "Unknown".into(),
                spindle_speed: "0".into(),
                spindle_temp: "0".into(),
                active_tool: "Unknown".into(),
                z_axis_power: "0".into(),
                timestamp_s: "0".into(),
            }
        );
    }

    #[test]
    fn block_layout() {
        let reading = CncReading::parse(&json!({ "programName": "P", "spindleActualSpeed": 5 }));
        let mut out = Vec::new();
        reading.write_block(&mut out, 3).unwrap();
        let text = String::from_utf8(out).unwrap();
        let expected = format!(
            "Message 3:\n  Program: P\n  Spindle Speed: 5 RPM\n  Spindle Temp: 0°C\n  \
             Active Tool: Unknown\n  Z-Axis Power: 0\n  Timestamp: 0s\n{}\n",
            "-".repeat(50)
        );
        assert_eq!(text, expected);
    }
}
