mod ephemerides;
mod gravity;
