pub mod a001_formulario;
pub mod a002_gasto;
pub mod a003_orden;
pub mod a004_contexto;
