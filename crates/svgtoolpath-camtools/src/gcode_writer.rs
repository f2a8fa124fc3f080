//! G-code writer
//!
//! Turns an ordered toolpath into layered G-code for an FDM printer, plus
//! the matching layer view data. Every layer repeats the same toolpath at
//! the next height.

use crate::error::Result;
use crate::optimizer::ToolpathOptimizer;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;
use svgtoolpath_core::Command;
use svgtoolpath_settings::{Config, GcodeFlavor};
use svgtoolpath_visualizer::{
    Layer, LayerData, LayerPolygon, SegmentKind, Vertex, TRAVEL_LINE_WIDTH,
};
use tracing::{debug, info};

/// Name written into flavor headers.
pub const GENERATOR_NAME: &str = "svgtoolpath";

/// Feedrate of the moves in the start sequence, mm/min.
const STARTUP_FEEDRATE: f64 = 15000.0;

/// Height and thickness of one printed layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSlice {
    /// Top of the layer, in mm above the plate
    pub height: f64,
    pub thickness: f64,
}

/// Layers needed to reach the requested print height.
///
/// The first layer is always printed, even when the requested height is
/// below its thickness.
pub fn plan_layers(config: &Config) -> Vec<LayerSlice> {
    let first = config.layers.layer_height_0;
    let step = config.layers.layer_height;
    let remaining = (config.reader.height - first).max(0.0);
    let extra = (remaining / step + 1e-9).floor() as usize;

    std::iter::once(LayerSlice {
        height: first,
        thickness: first,
    })
    .chain((0..extra).map(|i| LayerSlice {
        height: first + (i + 1) as f64 * step,
        thickness: step,
    }))
    .collect()
}

/// Machine-space bounding box of every position the print head moves to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl PrintBounds {
    /// Inverted box spanning the plate, so the first move always widens it.
    fn inverted(width: f64, depth: f64) -> Self {
        Self {
            min_x: width,
            min_y: depth,
            max_x: -width,
            max_y: -depth,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }
}

/// Everything produced for one print job.
#[derive(Debug, Clone)]
pub struct ToolpathOutput {
    pub gcode: String,
    pub layers: LayerData,
    pub bounds: PrintBounds,
    /// Final `E` position
    pub extruded: f64,
    /// Deposited plastic in mm³
    pub volume_used: f64,
    /// Rough duration in seconds, from move lengths and feedrates
    pub print_time: f64,
}

impl ToolpathOutput {
    pub fn save_gcode(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.gcode)?;
        Ok(())
    }

    pub fn layers_json(&self) -> Result<String> {
        Ok(self.layers.to_json()?)
    }
}

/// Printer state tracked while emitting moves.
struct MachineState {
    x: f64,
    y: f64,
    e: f64,
    /// mm/min
    f: f64,
    retracted: bool,
    bounds: PrintBounds,
    volume_used: f64,
    print_time: f64,
}

impl MachineState {
    fn new(config: &Config) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            e: 0.0,
            f: 0.0,
            // The start sequence leaves the filament retracted.
            retracted: config.retraction.enable,
            bounds: PrintBounds::inverted(config.machine.width, config.machine.depth),
            volume_used: 0.0,
            print_time: 0.0,
        }
    }

    /// Appends the axis words that change and moves there.
    fn move_to(&mut self, line: &mut String, x: f64, y: f64) {
        if x != self.x {
            self.x = x;
            self.bounds.min_x = self.bounds.min_x.min(x);
            self.bounds.max_x = self.bounds.max_x.max(x);
            line.push_str(&format!(" X{:.6}", x));
        }
        if y != self.y {
            self.y = y;
            self.bounds.min_y = self.bounds.min_y.min(y);
            self.bounds.max_y = self.bounds.max_y.max(y);
            line.push_str(&format!(" Y{:.6}", y));
        }
    }

    fn set_feedrate(&mut self, line: &mut String, feedrate: f64) {
        if feedrate != self.f {
            self.f = feedrate;
            line.push_str(&format!(" F{:.6}", feedrate));
        }
    }

    fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((x - self.x) * (x - self.x) + (y - self.y) * (y - self.y)).sqrt()
    }
}

/// Total extruded length of one pass over the toolpath.
pub fn extrude_length(commands: &[Command]) -> f64 {
    let mut length = 0.0;
    let mut last: Option<svgtoolpath_core::Point> = None;
    for command in commands {
        let position = command.position();
        if let (Command::Extrude(_), Some(from)) = (command, last) {
            length += from.distance_to(&position);
        }
        last = Some(position);
    }
    length
}

/// Serializes toolpaths for one configuration.
pub struct GcodeWriter<'a> {
    config: &'a Config,
}

impl<'a> GcodeWriter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Orders, optionally centers, and writes the commands as a full print.
    pub fn write(&self, commands: &[Command]) -> Result<ToolpathOutput> {
        self.config.validate()?;

        let mut commands = ToolpathOptimizer::sort_commands(commands)?;
        if self.config.reader.center_enabled {
            ToolpathOptimizer::center_commands(
                &mut commands,
                self.config.machine.width,
                self.config.machine.depth,
            );
        }

        let slices = plan_layers(self.config);
        let total_layer_length = if self.config.reader.spiralize {
            extrude_length(&commands)
        } else {
            0.0
        };

        let mut state = MachineState::new(self.config);
        let mut body = Vec::new();
        let mut layers = LayerData::new();
        for (layer_nr, slice) in slices.iter().enumerate() {
            let layer = self.write_layer(
                layer_nr,
                slice,
                &commands,
                total_layer_length,
                &mut state,
                &mut body,
            );
            layers.add_layer(layer);
        }

        let mut lines = self.start_sequence(&state);
        lines.append(&mut body);
        lines.extend(self.end_sequence());
        let mut gcode = lines.join("\n");
        if !gcode.ends_with('\n') {
            gcode.push('\n');
        }

        info!(
            layers = slices.len(),
            commands = commands.len(),
            extruded = state.e,
            flavor = %self.config.machine.gcode_flavor,
            "Wrote G-code"
        );

        Ok(ToolpathOutput {
            gcode,
            layers,
            bounds: state.bounds,
            extruded: state.e,
            volume_used: state.volume_used,
            print_time: state.print_time,
        })
    }

    /// G-code Y grows away from the operator, drawings grow downwards.
    fn machine_y(&self, y: f64) -> f64 {
        if self.config.machine.center_is_zero {
            -y
        } else {
            self.config.machine.depth - y
        }
    }

    fn view_vertex(&self, x: f64, y: f64, height: f64) -> Vertex {
        let machine = &self.config.machine;
        if machine.center_is_zero {
            Vertex {
                x,
                height,
                depth: -y,
            }
        } else {
            Vertex {
                x: x - machine.width / 2.0,
                height,
                depth: -y + machine.depth / 2.0,
            }
        }
    }

    fn write_layer(
        &self,
        layer_nr: usize,
        slice: &LayerSlice,
        commands: &[Command],
        total_layer_length: f64,
        state: &mut MachineState,
        out: &mut Vec<String>,
    ) -> Layer {
        let config = self.config;
        let spiralize = config.reader.spiralize;
        let retraction = &config.retraction;

        if layer_nr > 0 {
            out.push(format!(";LAYER:{layer_nr}"));
        }
        if !spiralize {
            out.push(format!("G0 Z{:.6}", slice.height));
        }
        if layer_nr == 1 {
            out.push(format!("M104 S{}", config.material.print_temperature));
            out.push(format!("M140 S{}", config.material.bed_temperature));
        }
        debug!(layer = layer_nr, height = slice.height, "Writing layer");

        let travel_speed = config.travel_speed_for_layer(layer_nr);
        let print_speed = config.print_speed_for_layer(layer_nr);
        let flow = config.flow_for_layer(layer_nr);
        let volumetric = config.machine.gcode_flavor.is_volumetric();
        let filament_area = PI * config.material.diameter * config.material.diameter / 4.0;
        let travel_kind = if retraction.enable {
            SegmentKind::MoveRetraction
        } else {
            SegmentKind::MoveCombing
        };

        let mut polygon = LayerPolygon::new(
            config.machine.extruder_number as usize,
            self.view_vertex(state.x, state.y, slice.height),
        );
        let mut layer_length = 0.0;

        for command in commands {
            match command {
                Command::Travel(travel) => {
                    let y = self.machine_y(travel.y);
                    if travel.x == state.x && y == state.y {
                        continue;
                    }
                    if !state.retracted && retraction.enable {
                        state.f = retraction.retract_speed * 60.0;
                        out.push(format!("G0 F{} E{:.6}", state.f, state.e - retraction.amount));
                        state.retracted = true;
                    }

                    state.print_time += state.distance_to(travel.x, y) / travel_speed;
                    let mut line = String::from("G0");
                    state.move_to(&mut line, travel.x, y);
                    state.set_feedrate(&mut line, travel_speed * 60.0);
                    out.push(line);

                    polygon.push_segment(
                        self.view_vertex(state.x, state.y, slice.height),
                        travel_kind,
                        TRAVEL_LINE_WIDTH,
                        0.0,
                        travel_speed,
                    );
                }
                Command::Extrude(extrude) => {
                    let y = self.machine_y(extrude.y);
                    let distance = state.distance_to(extrude.x, y);
                    layer_length += distance;
                    let ramp = if total_layer_length > 0.0 {
                        layer_length / total_layer_length
                    } else {
                        1.0
                    };

                    let mm3 = distance * slice.thickness * extrude.line_width * flow;
                    let delta_e = if volumetric { mm3 } else { mm3 / filament_area };

                    if state.retracted {
                        state.f = retraction.prime_speed * 60.0;
                        out.push(format!("G0 F{} E{:.6}", state.f, state.e));
                        state.retracted = false;
                    }

                    state.print_time += distance / print_speed;
                    let mut line = String::from("G1");
                    state.move_to(&mut line, extrude.x, y);
                    if spiralize {
                        let step = config.layers.layer_height;
                        line.push_str(&format!(" Z{:.6}", ramp * step - step + slice.height));
                    }
                    state.set_feedrate(&mut line, print_speed * 60.0);
                    if delta_e != 0.0 {
                        // The first spiral layer ramps up from nothing.
                        let share = if spiralize && layer_nr == 0 { ramp } else { 1.0 };
                        state.e += delta_e * share;
                        state.volume_used += mm3 * share;
                        line.push_str(&format!(" E{:.6}", state.e));
                    }
                    out.push(line);

                    polygon.push_segment(
                        self.view_vertex(state.x, state.y, slice.height),
                        SegmentKind::Inset0,
                        extrude.line_width,
                        slice.thickness,
                        print_speed,
                    );
                }
            }
        }

        let mut layer = Layer::new(layer_nr, slice.height, slice.thickness);
        if polygon.segment_count() > 0 {
            layer.polygons.push(polygon);
        }
        layer
    }

    /// Flavor header, heating, priming and the move to the first layer.
    fn start_sequence(&self, state: &MachineState) -> Vec<String> {
        let machine = &self.config.machine;
        let material = &self.config.material;
        let retraction = &self.config.retraction;
        let first_layer = self.config.layers.layer_height_0;
        let mut lines = Vec::new();

        if machine.gcode_flavor == GcodeFlavor::Griffin {
            let extruder = machine.extruder_number;
            let bounds = &state.bounds;
            let mut header = String::new();
            header.push_str(";START_OF_HEADER\n");
            header.push_str(";HEADER_VERSION:0.1\n");
            header.push_str(";FLAVOR:Griffin\n");
            header.push_str(&format!(";GENERATOR.NAME:{GENERATOR_NAME}\n"));
            header.push_str(&format!(
                ";GENERATOR.VERSION:{}\n",
                env!("CARGO_PKG_VERSION")
            ));
            header.push_str(&format!(
                ";GENERATOR.BUILD_DATE:{}\n",
                chrono::Local::now().format("%Y-%m-%d")
            ));
            header.push_str(&format!(";TARGET_MACHINE.NAME:{}\n", machine.name));
            header.push_str(&format!(
                ";EXTRUDER_TRAIN.{extruder}.INITIAL_TEMPERATURE:{}\n",
                material.print_temperature_layer_0
            ));
            header.push_str(&format!(
                ";EXTRUDER_TRAIN.{extruder}.MATERIAL.VOLUME_USED:{:.0}\n",
                state.volume_used
            ));
            header.push_str(&format!(
                ";EXTRUDER_TRAIN.{extruder}.MATERIAL.GUID:{}\n",
                material.guid
            ));
            header.push_str(&format!(
                ";EXTRUDER_TRAIN.{extruder}.NOZZLE.DIAMETER:{}\n",
                machine.nozzle_size
            ));
            header.push_str(&format!(
                ";EXTRUDER_TRAIN.{extruder}.NOZZLE.NAME:{}\n",
                machine.nozzle_id
            ));
            header.push_str(&format!(";BUILD_PLATE.TYPE:{}\n", machine.build_plate_type));
            header.push_str(&format!(
                ";BUILD_PLATE.INITIAL_TEMPERATURE:{}\n",
                material.bed_temperature_layer_0
            ));
            header.push_str(&format!(";PRINT.TIME:{:.0}\n", state.print_time));
            header.push_str(&format!(";PRINT.SIZE.MIN.X:{}\n", bounds.min_x));
            header.push_str(&format!(";PRINT.SIZE.MIN.Y:{}\n", bounds.min_y));
            header.push_str(&format!(";PRINT.SIZE.MIN.Z:{first_layer}\n"));
            header.push_str(&format!(";PRINT.SIZE.MAX.X:{}\n", bounds.max_x));
            header.push_str(&format!(";PRINT.SIZE.MAX.Y:{}\n", bounds.max_y));
            header.push_str(&format!(";PRINT.SIZE.MAX.Z:{first_layer}\n"));
            header.push_str(";END_OF_HEADER");
            lines.push(header);
        }

        if !machine.start_gcode.trim().is_empty() {
            lines.push(machine.start_gcode.trim_end().to_string());
        }

        lines.push(format!("T{}", machine.extruder_number));
        lines.push("M82".to_string());
        lines.push("G92 E0".to_string());
        lines.push(format!("M109 S{}", material.print_temperature_layer_0));
        lines.push(format!("M190 S{}", material.bed_temperature_layer_0));
        if machine.prime_blob_enable {
            lines.push(format!(
                "G0 F{STARTUP_FEEDRATE} X{} Y{} Z2",
                machine.prime_pos_x, machine.prime_pos_y
            ));
            lines.push("G280".to_string());
        }
        if retraction.enable {
            lines.push(format!(
                "G0 F{} E-{}",
                retraction.retract_speed * 60.0,
                retraction.amount
            ));
        }
        lines.push("M107".to_string());
        lines.push(format!("M204 S{}", machine.acceleration));
        lines.push(format!("M205 X{} Y{}", machine.jerk, machine.jerk));
        lines.push(";LAYER:0".to_string());
        lines.push(format!("G0 F{STARTUP_FEEDRATE} Z{first_layer}"));
        lines
    }

    /// Cool down, fans off, then the machine's own end G-code.
    fn end_sequence(&self) -> Vec<String> {
        let mut lines = vec![
            "M140 S0".to_string(),
            "M104 S0".to_string(),
            "M107".to_string(),
        ];
        let end = self.config.machine.end_gcode.trim_end();
        if !end.is_empty() {
            lines.push(end.to_string());
        }
        lines
    }
}

/// Orders and writes `commands` with `config`.
pub fn write_gcode(config: &Config, commands: &[Command]) -> Result<ToolpathOutput> {
    GcodeWriter::new(config).write(commands)
}
