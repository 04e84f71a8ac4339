use glam::{Mat4, Vec3};
use glrender::{
    abs::{Context, Geometry, Shader, Texture, Vertex},
    config::DemoConfig,
    light::{Light, LightUniforms},
    logging,
};
use sdl2::video::SwapInterval;

fn vertex(position: [f32; 2], color: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex {
        position: [position[0], position[1], 0.0, 1.0],
        color: [color[0], color[1], color[2], 1.0],
        uv,
        normal: [0.0, 0.0, -1.0, 0.0],
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_path) = DemoConfig::load()?;
    logging::init(config.log_level)?;
    match config_path {
        Some(path) => log::info!("Using config {}", path.display()),
        None => log::info!("No config file found, using defaults"),
    }

    let mut ctx = Context::init(
        &config.window.title,
        config.window.width,
        config.window.height,
    )?;
    let interval = if config.window.vsync {
        SwapInterval::VSync
    } else {
        SwapInterval::Immediate
    };
    if let Err(e) = ctx.video_subsystem.gl_set_swap_interval(interval) {
        log::warn!("Could not set swap interval: {}", e);
    }

    let assets = &config.assets;
    let gl = ctx.gl.clone();

    let tri_verts = [
        vertex([-0.5, -0.5], [0.0, 0.0, 1.0], [0.0, 0.0]),
        vertex([0.5, -0.5], [0.0, 1.0, 0.0], [1.0, 0.0]),
        vertex([0.0, 0.5], [1.0, 0.0, 0.0], [0.5, 1.0]),
    ];
    let quad_verts = [
        vertex([-1.0, -1.0], [0.0, 0.0, 0.0], [0.0, 0.0]),
        vertex([1.0, -1.0], [1.0, 0.0, 0.0], [1.0, 0.0]),
        vertex([-1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        vertex([1.0, 1.0], [0.0, 1.0, 0.0], [1.0, 1.0]),
    ];

    let mut triangle = Geometry::new(&gl, &tri_verts, &[2, 0, 1])?;
    let mut quad = Geometry::new(&gl, &quad_verts, &[3, 2, 0, 0, 1, 3])?;
    let mut cube = Geometry::load(&gl, assets.path("cube.obj"))?;
    let mut tri_obj = Geometry::load(&gl, assets.path("tri.obj"))?;

    let mut terry = Texture::load(&gl, assets.path("terry.png"))?;

    let mut basic_shader = Shader::load(
        &gl,
        assets.path("basic.vert"),
        assets.path("basic.frag"),
    )?;
    let mut mvp_shader = Shader::load(&gl, assets.path("mvp.vert"), assets.path("basic.frag"))?;
    let mut light_shader = Shader::load(
        &gl,
        assets.path("light.vert"),
        assets.path("light.frag"),
    )?;

    let sun = Light::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::ONE);

    let camera_pos = Vec3::new(5.0, 2.0, 7.0);
    let camera_target = Vec3::new(0.0, 0.0, -1.0);
    let proj = Mat4::perspective_rh_gl(
        80.0f32.to_radians(),
        config.window.aspect_ratio(),
        0.1,
        100.0,
    );
    let view = Mat4::look_at_rh(camera_pos, camera_target, Vec3::Y);
    let mut model = Mat4::IDENTITY;

    let shader = &light_shader;
    let model_slot = shader.uniform("u_model")?;
    let time_slot = shader.uniform("u_time")?;
    shader.set(&shader.uniform("u_projection")?, proj);
    shader.set(&shader.uniform("u_view")?, view);
    shader.set(&model_slot, model);
    shader.set(&shader.uniform("u_texture")?, terry.at_unit(0));
    LightUniforms::resolve(shader)?.apply(shader, &sun, Vec3::splat(0.1));

    model *= Mat4::from_scale(Vec3::new(1.0, 1.5, 1.25));

    while !ctx.should_close() {
        ctx.tick();

        let move_direction = ctx.input_direction();
        let rotate_axis = ctx.rotate_axis().normalize_or_zero();

        model *= Mat4::from_translation(move_direction);
        if rotate_axis != Vec3::ZERO {
            model *= Mat4::from_axis_angle(rotate_axis, 0.05f32.to_radians());
        }

        ctx.clear();
        shader.set(&model_slot, model);
        shader.set(&time_slot, ctx.time());
        cube.draw(shader);
    }

    triangle.free();
    quad.free();
    cube.free();
    tri_obj.free();

    basic_shader.free();
    mvp_shader.free();
    light_shader.free();

    terry.free();

    ctx.term();
    Ok(())
}
