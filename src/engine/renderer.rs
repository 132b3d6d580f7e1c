use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGlBuffer, WebGlProgram, WebGlRenderingContext, WebGlTexture, WebGlUniformLocation};
use nalgebra::Matrix4;
use crate::engine::mesh::{Mesh, VERTEX_STRIDE};

const MESH_VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    attribute vec2 aTexCoord;
    uniform mat4 uModelViewProjection;
    varying vec2 vTexCoord;
    void main() {
        gl_Position = uModelViewProjection * vec4(aPosition, 1.0);
        vTexCoord = aTexCoord;
    }
"#;

const MESH_FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    varying vec2 vTexCoord;
    uniform sampler2D uColorMap;
    uniform sampler2D uBumpMap;
    uniform bool uUseColorMap;
    uniform bool uUseBumpMap;
    uniform vec3 uColor;
    uniform vec3 uAmbient;
    uniform bool uLit;
    uniform float uOpacity;

    void main() {
        vec3 color = uColor;
        float alpha = uOpacity;

        if (uUseColorMap) {
            vec4 texColor = texture2D(uColorMap, vTexCoord);
            color *= texColor.rgb;
            alpha *= texColor.a;
        }

        // Low ground reads slightly darker
        if (uUseBumpMap) {
            float height = texture2D(uBumpMap, vTexCoord).r;
            color *= mix(0.85, 1.0, height);
        }

        if (uLit) {
            color *= uAmbient;
        }

        gl_FragColor = vec4(min(color, vec3(1.0)), alpha);
    }
"#;

const POINTS_VERTEX_SHADER: &str = r#"
    attribute vec3 aPosition;
    attribute vec3 aColor;
    uniform mat4 uModelView;
    uniform mat4 uProjection;
    uniform float uSize;
    uniform float uScale;
    varying vec3 vColor;
    void main() {
        vec4 mvPosition = uModelView * vec4(aPosition, 1.0);
        gl_Position = uProjection * mvPosition;
        gl_PointSize = uSize * (uScale / -mvPosition.z);
        vColor = aColor;
    }
"#;

const POINTS_FRAGMENT_SHADER: &str = r#"
    precision mediump float;
    varying vec3 vColor;
    uniform sampler2D uAlphaMap;
    void main() {
        float alpha = texture2D(uAlphaMap, vec2(gl_PointCoord.x, 1.0 - gl_PointCoord.y)).g;
        gl_FragColor = vec4(vColor, alpha);
    }
"#;

/// Geometry living in GPU buffers.
pub struct GpuMesh {
    vertex_buffer: WebGlBuffer,
    index_buffer: WebGlBuffer,
    index_count: i32,
}

pub struct GpuPoints {
    position_buffer: WebGlBuffer,
    color_buffer: WebGlBuffer,
    count: i32,
}

/// Surface parameters for one mesh draw.
pub struct MeshMaterial<'a> {
    pub color_map: Option<&'a WebGlTexture>,
    pub bump_map: Option<&'a WebGlTexture>,
    pub color: [f32; 3],
    pub opacity: f32,
    /// Unlit surfaces ignore the ambient light.
    pub lit: bool,
}

pub struct PointsMaterial<'a> {
    pub alpha_map: &'a WebGlTexture,
    pub size: f32,
}

struct MeshProgram {
    program: WebGlProgram,
    a_position: u32,
    a_tex_coord: u32,
    u_mvp: WebGlUniformLocation,
    u_use_color_map: WebGlUniformLocation,
    u_use_bump_map: WebGlUniformLocation,
    u_color: WebGlUniformLocation,
    u_ambient: WebGlUniformLocation,
    u_lit: WebGlUniformLocation,
    u_opacity: WebGlUniformLocation,
}

struct PointsProgram {
    program: WebGlProgram,
    a_position: u32,
    a_color: u32,
    u_model_view: WebGlUniformLocation,
    u_projection: WebGlUniformLocation,
    u_size: WebGlUniformLocation,
    u_scale: WebGlUniformLocation,
}

pub struct Renderer {
    pub gl: WebGlRenderingContext,
    mesh_program: MeshProgram,
    points_program: PointsProgram,
    ambient: [f32; 3],
    buffer_height: i32,
}

impl Renderer {
    pub fn new(gl: WebGlRenderingContext) -> Result<Self, JsValue> {
        let program = create_program(&gl, MESH_VERTEX_SHADER, MESH_FRAGMENT_SHADER)?;
        gl.use_program(Some(&program));
        let color_map = uniform(&gl, &program, "uColorMap")?;
        let bump_map = uniform(&gl, &program, "uBumpMap")?;
        gl.uniform1i(Some(&color_map), 0);
        gl.uniform1i(Some(&bump_map), 1);

        let mesh_program = MeshProgram {
            a_position: attribute(&gl, &program, "aPosition")?,
            a_tex_coord: attribute(&gl, &program, "aTexCoord")?,
            u_mvp: uniform(&gl, &program, "uModelViewProjection")?,
            u_use_color_map: uniform(&gl, &program, "uUseColorMap")?,
            u_use_bump_map: uniform(&gl, &program, "uUseBumpMap")?,
            u_color: uniform(&gl, &program, "uColor")?,
            u_ambient: uniform(&gl, &program, "uAmbient")?,
            u_lit: uniform(&gl, &program, "uLit")?,
            u_opacity: uniform(&gl, &program, "uOpacity")?,
            program,
        };

        let program = create_program(&gl, POINTS_VERTEX_SHADER, POINTS_FRAGMENT_SHADER)?;
        gl.use_program(Some(&program));
        let alpha_map = uniform(&gl, &program, "uAlphaMap")?;
        gl.uniform1i(Some(&alpha_map), 0);

        let points_program = PointsProgram {
            a_position: attribute(&gl, &program, "aPosition")?,
            a_color: attribute(&gl, &program, "aColor")?,
            u_model_view: uniform(&gl, &program, "uModelView")?,
            u_projection: uniform(&gl, &program, "uProjection")?,
            u_size: uniform(&gl, &program, "uSize")?,
            u_scale: uniform(&gl, &program, "uScale")?,
            program,
        };

        gl.enable(WebGlRenderingContext::CULL_FACE);
        gl.cull_face(WebGlRenderingContext::BACK);

        Ok(Renderer {
            gl,
            mesh_program,
            points_program,
            ambient: [1.0, 1.0, 1.0],
            buffer_height: 1,
        })
    }

    pub fn canvas(&self) -> Option<HtmlCanvasElement> {
        self.gl.canvas().and_then(|c| c.dyn_into::<HtmlCanvasElement>().ok())
    }

    /// Resizes the drawing buffer (device pixels) and the GL viewport with it.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if let Some(canvas) = self.canvas() {
            canvas.set_width(width);
            canvas.set_height(height);
        }
        self.buffer_height = height as i32;
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    /// White ambient light scaled by `intensity`.
    pub fn set_ambient(&mut self, intensity: f32) {
        self.ambient = [intensity; 3];
    }

    pub fn clear(&self, r: f32, g: f32, b: f32) {
        self.gl.clear_color(r, g, b, 1.0);
        self.gl.clear(WebGlRenderingContext::COLOR_BUFFER_BIT | WebGlRenderingContext::DEPTH_BUFFER_BIT);
    }

    pub fn enable_depth_test(&self) {
        self.gl.enable(WebGlRenderingContext::DEPTH_TEST);
    }

    pub fn upload_mesh(&self, mesh: &Mesh) -> Result<GpuMesh, JsValue> {
        let vertex_buffer = self.gl.create_buffer().ok_or("Failed to create vertex buffer")?;
        let index_buffer = self.gl.create_buffer().ok_or("Failed to create index buffer")?;

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&vertex_buffer));
        unsafe {
            let vert_array = js_sys::Float32Array::view(&mesh.vertices);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ARRAY_BUFFER,
                &vert_array,
                WebGlRenderingContext::STATIC_DRAW
            );
        }

        self.gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&index_buffer));
        unsafe {
            let idx_array = js_sys::Uint16Array::view(&mesh.indices);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ELEMENT_ARRAY_BUFFER,
                &idx_array,
                WebGlRenderingContext::STATIC_DRAW
            );
        }

        Ok(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as i32,
        })
    }

    pub fn draw_mesh(&self, mesh: &GpuMesh, material: &MeshMaterial, model: &Matrix4<f32>, view_proj: &Matrix4<f32>) {
        let p = &self.mesh_program;
        self.gl.use_program(Some(&p.program));

        if let Some(tex) = material.color_map {
            self.gl.active_texture(WebGlRenderingContext::TEXTURE0);
            self.gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(tex));
        }
        if let Some(tex) = material.bump_map {
            self.gl.active_texture(WebGlRenderingContext::TEXTURE1);
            self.gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(tex));
        }
        self.gl.uniform1i(Some(&p.u_use_color_map), material.color_map.is_some() as i32);
        self.gl.uniform1i(Some(&p.u_use_bump_map), material.bump_map.is_some() as i32);
        self.gl.uniform3fv_with_f32_array(Some(&p.u_color), &material.color);
        self.gl.uniform3fv_with_f32_array(Some(&p.u_ambient), &self.ambient);
        self.gl.uniform1i(Some(&p.u_lit), material.lit as i32);
        self.gl.uniform1f(Some(&p.u_opacity), material.opacity);

        if material.opacity < 1.0 || material.color_map.is_some() {
            self.gl.enable(WebGlRenderingContext::BLEND);
            self.gl.blend_func(WebGlRenderingContext::SRC_ALPHA, WebGlRenderingContext::ONE_MINUS_SRC_ALPHA);
        } else {
            self.gl.disable(WebGlRenderingContext::BLEND);
        }

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&mesh.vertex_buffer));
        self.gl.bind_buffer(WebGlRenderingContext::ELEMENT_ARRAY_BUFFER, Some(&mesh.index_buffer));

        let stride = (VERTEX_STRIDE * 4) as i32;
        self.gl.vertex_attrib_pointer_with_i32(p.a_position, 3, WebGlRenderingContext::FLOAT, false, stride, 0);
        self.gl.enable_vertex_attrib_array(p.a_position);
        self.gl.vertex_attrib_pointer_with_i32(p.a_tex_coord, 2, WebGlRenderingContext::FLOAT, false, stride, 12);
        self.gl.enable_vertex_attrib_array(p.a_tex_coord);

        let mvp = view_proj * model;
        self.gl.uniform_matrix4fv_with_f32_array(Some(&p.u_mvp), false, mvp.as_slice());

        self.gl.draw_elements_with_i32(
            WebGlRenderingContext::TRIANGLES,
            mesh.index_count,
            WebGlRenderingContext::UNSIGNED_SHORT,
            0
        );

        self.gl.disable_vertex_attrib_array(p.a_position);
        self.gl.disable_vertex_attrib_array(p.a_tex_coord);
    }

    pub fn upload_points(&self, positions: &[f32], colors: &[f32]) -> Result<GpuPoints, JsValue> {
        let position_buffer = self.gl.create_buffer().ok_or("Failed to create position buffer")?;
        let color_buffer = self.gl.create_buffer().ok_or("Failed to create color buffer")?;

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&position_buffer));
        unsafe {
            let array = js_sys::Float32Array::view(positions);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ARRAY_BUFFER,
                &array,
                WebGlRenderingContext::DYNAMIC_DRAW
            );
        }

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&color_buffer));
        unsafe {
            let array = js_sys::Float32Array::view(colors);
            self.gl.buffer_data_with_array_buffer_view(
                WebGlRenderingContext::ARRAY_BUFFER,
                &array,
                WebGlRenderingContext::STATIC_DRAW
            );
        }

        Ok(GpuPoints {
            position_buffer,
            color_buffer,
            count: (positions.len() / 3) as i32,
        })
    }

    /// Re-uploads point positions in place.
    pub fn update_points(&self, points: &GpuPoints, positions: &[f32]) {
        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&points.position_buffer));
        unsafe {
            let array = js_sys::Float32Array::view(positions);
            self.gl.buffer_sub_data_with_i32_and_array_buffer_view(
                WebGlRenderingContext::ARRAY_BUFFER,
                0,
                &array
            );
        }
    }

    /// Additive, depth-tested but not depth-writing point sprites.
    pub fn draw_points(&self, points: &GpuPoints, material: &PointsMaterial, model: &Matrix4<f32>, view: &Matrix4<f32>, projection: &Matrix4<f32>) {
        let p = &self.points_program;
        self.gl.use_program(Some(&p.program));

        self.gl.active_texture(WebGlRenderingContext::TEXTURE0);
        self.gl.bind_texture(WebGlRenderingContext::TEXTURE_2D, Some(material.alpha_map));

        self.gl.enable(WebGlRenderingContext::BLEND);
        self.gl.blend_func(WebGlRenderingContext::SRC_ALPHA, WebGlRenderingContext::ONE);
        self.gl.depth_mask(false);

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&points.position_buffer));
        self.gl.vertex_attrib_pointer_with_i32(p.a_position, 3, WebGlRenderingContext::FLOAT, false, 0, 0);
        self.gl.enable_vertex_attrib_array(p.a_position);

        self.gl.bind_buffer(WebGlRenderingContext::ARRAY_BUFFER, Some(&points.color_buffer));
        self.gl.vertex_attrib_pointer_with_i32(p.a_color, 3, WebGlRenderingContext::FLOAT, false, 0, 0);
        self.gl.enable_vertex_attrib_array(p.a_color);

        let model_view = view * model;
        self.gl.uniform_matrix4fv_with_f32_array(Some(&p.u_model_view), false, model_view.as_slice());
        self.gl.uniform_matrix4fv_with_f32_array(Some(&p.u_projection), false, projection.as_slice());
        self.gl.uniform1f(Some(&p.u_size), material.size);
        self.gl.uniform1f(Some(&p.u_scale), self.buffer_height as f32 / 2.0);

        self.gl.draw_arrays(WebGlRenderingContext::POINTS, 0, points.count);

        self.gl.disable_vertex_attrib_array(p.a_position);
        self.gl.disable_vertex_attrib_array(p.a_color);
        self.gl.depth_mask(true);
        self.gl.disable(WebGlRenderingContext::BLEND);
    }
}

fn attribute(gl: &WebGlRenderingContext, program: &WebGlProgram, name: &str) -> Result<u32, JsValue> {
    let location = gl.get_attrib_location(program, name);
    if location < 0 {
        return Err(JsValue::from_str(&format!("Failed to get {name} location")));
    }
    Ok(location as u32)
}

fn uniform(gl: &WebGlRenderingContext, program: &WebGlProgram, name: &str) -> Result<WebGlUniformLocation, JsValue> {
    gl.get_uniform_location(program, name)
        .ok_or_else(|| JsValue::from_str(&format!("Failed to get {name} location")))
}

fn create_program(gl: &WebGlRenderingContext, vertex_source: &str, fragment_source: &str) -> Result<WebGlProgram, JsValue> {
    let vert_shader = compile_shader(gl, WebGlRenderingContext::VERTEX_SHADER, vertex_source)?;
    let frag_shader = compile_shader(gl, WebGlRenderingContext::FRAGMENT_SHADER, fragment_source)?;

    let program = gl.create_program().ok_or("Unable to create program")?;
    gl.attach_shader(&program, &vert_shader);
    gl.attach_shader(&program, &frag_shader);
    gl.link_program(&program);

    if gl.get_program_parameter(&program, WebGlRenderingContext::LINK_STATUS).as_bool().unwrap_or(false) {
        Ok(program)
    } else {
        Err(JsValue::from_str(&gl.get_program_info_log(&program).unwrap_or_default()))
    }
}

fn compile_shader(gl: &WebGlRenderingContext, shader_type: u32, source: &str) -> Result<web_sys::WebGlShader, JsValue> {
    let shader = gl.create_shader(shader_type).ok_or("Unable to create shader")?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    if gl.get_shader_parameter(&shader, WebGlRenderingContext::COMPILE_STATUS).as_bool().unwrap_or(false) {
        Ok(shader)
    } else {
        Err(JsValue::from_str(&gl.get_shader_info_log(&shader).unwrap_or_default()))
    }
}
