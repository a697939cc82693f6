mod scenario;
mod targeter;
